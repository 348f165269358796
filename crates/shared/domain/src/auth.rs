//! Token types shared by the server and the client.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::TOKEN_TYPE_BEARER;

/// Purpose of a JWT. Access tokens authorize API calls, refresh tokens only
/// buy a new pair from `/auth/refresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub token_type: TokenKind,
    /// Unique token id; refresh tokens are tracked by it
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Token pair returned by login and refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TokenPair {
    /// Short-lived JWT for the `Authorization` header
    pub access_token: String,
    /// Long-lived JWT accepted only by `/auth/refresh` and `/auth/logout`
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

impl TokenPair {
    pub fn bearer(
        access_token: String,
        refresh_token: String,
        expires_in: i64,
        refresh_expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in,
            refresh_expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TokenKind::Refresh).unwrap(), "\"refresh\"");
        let kind: TokenKind = serde_json::from_str("\"access\"").unwrap();
        assert_eq!(kind, TokenKind::Access);
    }

    #[test]
    fn test_bearer_pair() {
        let pair = TokenPair::bearer("a".into(), "r".into(), 900, 604_800);
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 900);
    }
}
