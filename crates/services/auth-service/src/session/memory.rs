//! In-process session store for single-node deployments and tests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use common::AppResult;

use super::SessionStore;

struct Entry {
    user_id: Uuid,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, jti: Uuid, user_id: Uuid, ttl_seconds: u64) -> AppResult<()> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            jti,
            Entry {
                user_id,
                expires_at: now + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn take(&self, jti: Uuid) -> AppResult<Option<Uuid>> {
        let entry = self.sessions.write().await.remove(&jti);
        Ok(entry
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.user_id))
    }

    async fn revoke(&self, jti: Uuid) -> AppResult<()> {
        self.sessions.write().await.remove(&jti);
        Ok(())
    }

    async fn revoke_all(&self, user_id: Uuid) -> AppResult<u64> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let mut expired = 0;
        sessions.retain(|_, entry| {
            if entry.user_id != user_id {
                return true;
            }
            if entry.expires_at <= now {
                expired += 1;
            }
            false
        });
        Ok((before - sessions.len() - expired) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_take_consumes_once() {
        let store = MemorySessionStore::new();
        let (jti, user) = (Uuid::new_v4(), Uuid::new_v4());
        store.save(jti, user, 60).await.unwrap();

        assert_eq!(store.take(jti).await.unwrap(), Some(user));
        assert_eq!(store.take(jti).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_cannot_be_taken() {
        let store = MemorySessionStore::new();
        let jti = Uuid::new_v4();
        store.save(jti, Uuid::new_v4(), 0).await.unwrap();
        assert_eq!(store.take(jti).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_revoke_all_only_touches_one_user() {
        let store = MemorySessionStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        store.save(Uuid::new_v4(), alice, 60).await.unwrap();
        store.save(Uuid::new_v4(), alice, 60).await.unwrap();
        let bobs = Uuid::new_v4();
        store.save(bobs, bob, 60).await.unwrap();

        assert_eq!(store.revoke_all(alice).await.unwrap(), 2);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.take(bobs).await.unwrap(), Some(bob));
    }
}
