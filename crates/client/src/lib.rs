//! HTTP client for the diary API.
//!
//! [`DiaryClient`] attaches the current access token to every request and
//! keeps the session alive: tokens are refreshed shortly before they expire,
//! a 401 triggers one refresh and one retry, and concurrent callers share a
//! single refresh request.

pub mod client;
pub mod config;
pub mod error;
pub mod token;

pub use client::DiaryClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use token::{
    FileTokenStore, HttpRefresher, MemoryTokenStore, SessionState, TokenInfo, TokenManager,
    TokenRefresher, TokenStore,
};
