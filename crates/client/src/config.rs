//! Client configuration.

use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Default API base URL
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Refresh this long before the access token expires
pub const DEFAULT_REFRESH_LEEWAY: Duration = Duration::from_secs(60);

/// Per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL without a trailing slash
    pub base_url: String,
    pub refresh_leeway: Duration,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            refresh_leeway: DEFAULT_REFRESH_LEEWAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load from `DIARY_API_URL`, `DIARY_REFRESH_LEEWAY_SECONDS` and
    /// `DIARY_TIMEOUT_SECONDS`.
    pub fn from_env() -> ClientResult<Self> {
        let mut config = match std::env::var("DIARY_API_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        };
        if let Some(secs) = env_seconds("DIARY_REFRESH_LEEWAY_SECONDS")? {
            config.refresh_leeway = secs;
        }
        if let Some(secs) = env_seconds("DIARY_TIMEOUT_SECONDS")? {
            config.timeout = secs;
        }
        Ok(config)
    }
}

fn env_seconds(key: &str) -> ClientResult<Option<Duration>> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ClientError::Config(format!("{} must be a number of seconds", key))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = ClientConfig::new("https://diary.example.com/");
        assert_eq!(config.base_url, "https://diary.example.com");
        assert_eq!(config.refresh_leeway, Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
