//! Redis-backed session store shared by every API node.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use uuid::Uuid;

use common::{AppError, AppResult};

use super::SessionStore;

/// Cache key prefix for refresh-token ids
const SESSION_PREFIX: &str = "session:";

/// Cache key prefix for the set of a user's refresh-token ids
const USER_SESSIONS_PREFIX: &str = "user_sessions:";

#[derive(Clone)]
pub struct RedisSessionStore {
    connection: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    fn session_key(jti: Uuid) -> String {
        format!("{}{}", SESSION_PREFIX, jti)
    }

    fn user_key(user_id: Uuid) -> String {
        format!("{}{}", USER_SESSIONS_PREFIX, user_id)
    }

    /// GETDEL the session key and drop it from its owner's set.
    async fn consume(&self, jti: Uuid) -> AppResult<Option<Uuid>> {
        let mut conn = self.connection.clone();
        let owner: Option<String> = redis::cmd("GETDEL")
            .arg(Self::session_key(jti))
            .query_async(&mut conn)
            .await?;

        let Some(owner) = owner else {
            return Ok(None);
        };
        let user_id = Uuid::parse_str(&owner)
            .map_err(|e| AppError::internal(format!("Corrupt session entry: {}", e)))?;
        let _: () = conn
            .srem(Self::user_key(user_id), jti.to_string())
            .await?;
        Ok(Some(user_id))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn save(&self, jti: Uuid, user_id: Uuid, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let user_key = Self::user_key(user_id);

        let _: () = conn
            .set_ex(Self::session_key(jti), user_id.to_string(), ttl_seconds)
            .await?;
        let _: () = conn.sadd(&user_key, jti.to_string()).await?;
        // The set lives as long as the newest token
        let _: () = conn.expire(&user_key, ttl_seconds as i64).await?;
        Ok(())
    }

    async fn take(&self, jti: Uuid) -> AppResult<Option<Uuid>> {
        self.consume(jti).await
    }

    async fn revoke(&self, jti: Uuid) -> AppResult<()> {
        self.consume(jti).await?;
        Ok(())
    }

    async fn revoke_all(&self, user_id: Uuid) -> AppResult<u64> {
        let mut conn = self.connection.clone();
        let user_key = Self::user_key(user_id);

        let ids: Vec<String> = conn.smembers(&user_key).await?;
        let keys: Vec<String> = ids
            .iter()
            .map(|id| format!("{}{}", SESSION_PREFIX, id))
            .collect();

        let removed: u64 = if keys.is_empty() {
            0
        } else {
            conn.del(&keys).await?
        };
        let _: () = conn.del(&user_key).await?;
        Ok(removed)
    }
}
