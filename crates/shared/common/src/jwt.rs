//! HS256 token encoding and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use domain::{Claims, TokenKind, User};

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

/// Signs and verifies access and refresh tokens with one shared secret.
#[derive(Clone)]
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; clients refresh ahead of time.
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(config.secret_bytes()),
            decoding: DecodingKey::from_secret(config.secret_bytes()),
            validation,
        }
    }

    /// Issue a token of the given kind for a user, valid for `ttl_seconds`.
    pub fn issue(&self, user: &User, kind: TokenKind, ttl_seconds: i64) -> AppResult<(String, Claims)> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(ttl_seconds);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.to_string(),
            token_type: kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok((token, claims))
    }

    /// Verify signature and expiry, then check the token is of the expected kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> AppResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)?.claims;
        if claims.token_type != expected {
            tracing::debug!(
                expected = %expected,
                actual = %claims.token_type,
                "Token of the wrong kind presented"
            );
            return Err(AppError::Unauthorized);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> JwtCodec {
        JwtCodec::new(&JwtConfig::new(secret, 15, 7).unwrap())
    }

    fn user() -> User {
        User::new(
            Uuid::new_v4(),
            "reader@example.com".to_string(),
            "hash".to_string(),
            "Reader".to_string(),
        )
    }

    const SECRET: &str = "test-secret-key-that-is-long-enough";

    #[test]
    fn test_issue_and_verify() {
        let codec = codec(SECRET);
        let user = user();
        let (token, issued) = codec.issue(&user, TokenKind::Access, 60).unwrap();

        let claims = codec.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims, issued);
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, "user");
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_kind_mismatch_is_unauthorized() {
        let codec = codec(SECRET);
        let (token, _) = codec.issue(&user(), TokenKind::Refresh, 60).unwrap();
        assert!(matches!(
            codec.verify(&token, TokenKind::Access),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_expired_token_reports_token_expired() {
        let codec = codec(SECRET);
        let (token, _) = codec.issue(&user(), TokenKind::Access, -5).unwrap();
        let err = codec.verify(&token, TokenKind::Access).unwrap_err();
        assert_eq!(err.code(), "TOKEN_EXPIRED");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (token, _) = codec(SECRET)
            .issue(&user(), TokenKind::Access, 60)
            .unwrap();
        let err = codec("another-secret-key-that-is-long-enough")
            .verify(&token, TokenKind::Access)
            .unwrap_err();
        assert_eq!(err.code(), "AUTH_ERROR");
    }
}
