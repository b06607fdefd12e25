//! crates/food_share_client/src/config.rs
//!
//! Where the client finds the API, read from the environment.

use std::time::Duration;

use crate::error::ClientError;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Root of the API, without a trailing slash.
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `FOOD_SHARE_API_URL` and `FOOD_SHARE_TIMEOUT_SECS`, loading a
    /// `.env` file first outside of tests.
    pub fn from_env() -> Result<Self, ClientError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let base_url =
            std::env::var("FOOD_SHARE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::Config(
                "FOOD_SHARE_API_URL".to_string(),
                format!("'{}' is not an http(s) URL", base_url),
            ));
        }

        let timeout = match std::env::var("FOOD_SHARE_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                ClientError::Config("FOOD_SHARE_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            timeout,
            ..Self::new(base_url)
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let config = ClientConfig::new("http://10.0.2.2:3000/");
        assert_eq!(config.base_url, "http://10.0.2.2:3000");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
