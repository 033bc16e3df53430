use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Flat key/value bundle for one (locale, namespace) pair.
pub type Bundle = HashMap<String, String>;

/// Failure while fetching a namespace bundle from the translation backend.
///
/// Clonable so a single failure can be handed to every caller coalesced onto
/// the same fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Non-success HTTP status from the backend.
    #[error("translation backend returned {status} {reason}")]
    Status { status: u16, reason: String },

    /// The request never produced a response (connection, timeout, body read).
    #[error("translation request failed: {0}")]
    Transport(String),

    /// The response JSON object had no properties to unwrap.
    #[error("translation response contained no bundle")]
    EmptyDocument,

    /// The wrapped bundle was not a JSON object.
    #[error("translation response bundle is not an object")]
    MalformedDocument,

    /// A bundle entry held something other than a string.
    #[error("bundle entry '{key}' is not a string")]
    NonStringValue { key: String },
}

/// Fetches one namespace's full flat bundle from the translation backend.
///
/// Stateless apart from the HTTP client; caching and deduplication live in
/// `cache::NamespaceCache`.
#[derive(Debug, Clone)]
pub struct NamespaceFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl NamespaceFetcher {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Fetch the flat bundle for `namespace` in `locale`.
    ///
    /// The locale travels as the `Accept-Language` query parameter. The
    /// response is a JSON object whose first top-level property wraps the
    /// bundle; the property's name is not part of the contract and is
    /// ignored.
    pub async fn fetch_bundle(&self, locale: &str, namespace: &str) -> Result<Bundle, FetchError> {
        let url = format!("{}/v1/translation/{}", self.base_url, namespace);

        let response = self
            .client
            .get(&url)
            .query(&[("format", "flat"), ("Accept-Language", locale)])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }

        let document: serde_json::Map<String, Value> = response
            .json()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let (wrapper, content) = document
            .into_iter()
            .next()
            .ok_or(FetchError::EmptyDocument)?;
        debug!(
            "Fetched namespace '{}' for locale '{}' (bundle property '{}')",
            namespace, locale, wrapper
        );

        let entries = match content {
            Value::Object(entries) => entries,
            _ => return Err(FetchError::MalformedDocument),
        };

        let mut bundle = Bundle::with_capacity(entries.len());
        for (key, value) in entries {
            match value {
                Value::String(text) => {
                    bundle.insert(key, text);
                }
                _ => return Err(FetchError::NonStringValue { key }),
            }
        }

        Ok(bundle)
    }
}
