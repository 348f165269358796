//! Access/refresh token lifecycle.

mod claims;
mod manager;
mod refresher;
mod store;

pub use claims::TokenInfo;
pub use manager::{SessionState, TokenManager};
pub use refresher::{HttpRefresher, TokenRefresher};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

#[cfg(any(test, feature = "test-utils"))]
pub use refresher::MockTokenRefresher;
