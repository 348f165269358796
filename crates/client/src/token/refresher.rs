//! The network call that exchanges a refresh token.

use async_trait::async_trait;
use serde_json::json;

use domain::TokenPair;

use crate::error::{ClientError, ClientResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Exchanges a refresh token for a new pair.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> ClientResult<TokenPair>;
}

/// Calls `POST /auth/refresh`.
pub struct HttpRefresher {
    http: reqwest::Client,
    url: String,
}

impl HttpRefresher {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            url: format!("{}/auth/refresh", base_url),
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpRefresher {
    async fn refresh(&self, refresh_token: &str) -> ClientResult<TokenPair> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }
        Ok(response.json().await?)
    }
}
