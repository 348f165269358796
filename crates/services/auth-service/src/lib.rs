//! Auth Service Library
//!
//! Registration, login and the access/refresh token pair lifecycle.
//! Refresh tokens are single use: every refresh consumes the presented
//! token's id from the session store and issues a new pair.

pub mod service;
pub mod session;

pub use service::{AuthService, Authenticator};
pub use session::{MemorySessionStore, RedisSessionStore, SessionStore};
