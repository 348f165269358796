//! Client error types.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Result type alias using ClientError
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by [`crate::DiaryClient`].
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("{message} ({status} {code})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token store error: {0}")]
    Store(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl ClientError {
    /// Build an [`ClientError::Api`] from a non-success response.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_body(status, &body)
    }

    fn from_body(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => ClientError::Api {
                status: status.as_u16(),
                code: envelope.error.code,
                message: envelope.error.message,
            },
            Err(_) => ClientError::Api {
                status: status.as_u16(),
                code: "HTTP_ERROR".to_string(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unexpected response")
                    .to_string(),
            },
        }
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The server refused the refresh token itself.
    ///
    /// Anything else (timeouts, refused connections, 5xx) is transient and
    /// leaves the stored session untouched.
    pub fn is_refresh_rejection(&self) -> bool {
        matches!(
            self,
            ClientError::Api {
                status: 400 | 401 | 403,
                ..
            }
        )
    }
}
