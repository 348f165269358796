//! Errors raised while checking diary, account and site rules.
//!
//! Access control and lookups live in the service layer; the domain only
//! reports input that breaks a rule and failures of the password hasher.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input breaks a rule, e.g. an empty title or an oversized entry
    #[error("Validation error: {0}")]
    Validation(String),

    /// Password does not meet the policy
    #[error("Password error: {0}")]
    Password(String),

    /// Hashing or hash parsing failed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn password(msg: impl Into<String>) -> Self {
        DomainError::Password(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::Internal(msg.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

