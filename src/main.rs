//! Resolve translation keys from the command line.
//!
//! Usage:
//!   cargo run -- '#checkout.title' '#checkout.confirm'
//!
//! Required environment variables:
//! - TRANSLATION_API_URL
//!
//! Optional:
//! - TRANSLATION_LOCALE (defaults to en_US)
//! - HTTP_TIMEOUT_SECS (defaults to 30)

use std::time::Duration;

use anyhow::Result;
use tracing::info;
use translation_key_cache::cache::NamespaceCache;
use translation_key_cache::config::Config;
use translation_key_cache::fetcher::NamespaceFetcher;
use translation_key_cache::resolver::KeyResolver;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_key_cache=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;

    let key_identifiers: Vec<String> = std::env::args().skip(1).collect();
    if key_identifiers.is_empty() {
        anyhow::bail!("Usage: translation-key-cache '#<namespace>.<key>' [more keys...]");
    }

    info!(
        "Resolving {} keys for locale {}",
        key_identifiers.len(),
        config.locale
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;
    let fetcher = NamespaceFetcher::new(client, &config.api_url);
    let resolver = KeyResolver::new(NamespaceCache::new(fetcher));

    let results = resolver.resolve_keys(&key_identifiers, &config.locale).await;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
