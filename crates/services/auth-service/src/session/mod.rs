//! Refresh-token session tracking.

mod memory;
mod redis_store;

use async_trait::async_trait;
use uuid::Uuid;

use common::AppResult;

pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Tracks which refresh tokens (by `jti`) are still redeemable.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Record a freshly issued refresh token
    async fn save(&self, jti: Uuid, user_id: Uuid, ttl_seconds: u64) -> AppResult<()>;

    /// Atomically consume a refresh token, returning its owner if it was live
    async fn take(&self, jti: Uuid) -> AppResult<Option<Uuid>>;

    /// Forget one refresh token
    async fn revoke(&self, jti: Uuid) -> AppResult<()>;

    /// Forget every refresh token of a user, returning how many were live
    async fn revoke_all(&self, user_id: Uuid) -> AppResult<u64>;
}
