//! Common utilities shared across the workspace.
//!
//! This crate provides:
//! - Unified error handling with HTTP response mapping
//! - Configuration sections loaded from the environment
//! - JWT encoding and verification (feature `jwt`)

pub mod config;
pub mod error;
#[cfg(feature = "jwt")]
pub mod jwt;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
#[cfg(feature = "jwt")]
pub use jwt::JwtCodec;
