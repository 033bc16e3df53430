use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Translation backend
    pub api_url: String,
    pub locale: String,

    // HTTP
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Translation backend base URL, e.g. https://localization-api.example.com
            api_url: std::env::var("TRANSLATION_API_URL")
                .context("TRANSLATION_API_URL not set")?,
            locale: std::env::var("TRANSLATION_LOCALE")
                .unwrap_or_else(|_| "en_US".to_string()),

            // HTTP
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        })
    }
}
