//! Reading token metadata on the client side.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use domain::TokenKind;

use crate::error::{ClientError, ClientResult};

#[derive(Deserialize)]
struct RawClaims {
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    sub: Option<Uuid>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    token_type: Option<TokenKind>,
}

/// What the client knows about a token without holding the signing secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub subject: Option<Uuid>,
    pub role: Option<String>,
    pub kind: Option<TokenKind>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl TokenInfo {
    /// Decode the payload of a JWT.
    ///
    /// The signature is not checked; the server does that on every request.
    pub fn parse(token: &str) -> ClientResult<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<RawClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| ClientError::InvalidToken(e.to_string()))?;
        let claims = data.claims;

        let expires_at = timestamp(claims.exp)
            .ok_or_else(|| ClientError::InvalidToken("exp is out of range".to_string()))?;

        Ok(Self {
            subject: claims.sub,
            role: claims.role,
            kind: claims.token_type,
            issued_at: claims.iat.and_then(timestamp),
            expires_at,
        })
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// True when the token expires within `leeway` of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        self.remaining(now) <= leeway
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    /// Sign a token the way the server does, expiring `ttl_secs` from now.
    pub(crate) fn make_token(kind: &str, ttl_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = json!({
            "sub": Uuid::new_v4(),
            "email": "writer@example.com",
            "role": "user",
            "token_type": kind,
            "jti": Uuid::new_v4(),
            "iat": now,
            "exp": now + ttl_secs,
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"some-server-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_reads_claims() {
        let info = TokenInfo::parse(&make_token("access", 900)).unwrap();

        assert_eq!(info.kind, Some(TokenKind::Access));
        assert_eq!(info.role.as_deref(), Some("user"));
        assert!(info.subject.is_some());
        let remaining = info.remaining(Utc::now()).as_secs();
        assert!((895..=900).contains(&remaining));
    }

    #[test]
    fn test_parse_accepts_expired_tokens() {
        let info = TokenInfo::parse(&make_token("refresh", -60)).unwrap();

        assert_eq!(info.remaining(Utc::now()), Duration::ZERO);
        assert!(info.is_expired(Utc::now(), Duration::ZERO));
    }

    #[test]
    fn test_is_expired_honours_leeway() {
        let info = TokenInfo::parse(&make_token("access", 30)).unwrap();
        let now = Utc::now();

        assert!(!info.is_expired(now, Duration::from_secs(5)));
        assert!(info.is_expired(now, Duration::from_secs(60)));
    }

    #[test]
    fn test_parse_requires_exp() {
        let token = encode(
            &Header::default(),
            &json!({ "sub": Uuid::new_v4() }),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(
            TokenInfo::parse(&token),
            Err(ClientError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TokenInfo::parse("not.a.jwt").is_err());
        assert!(TokenInfo::parse("").is_err());
    }
}
