//! Rate-limit counters backed by Redis, or by process memory when no
//! Redis URL is configured.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use redis::{aio::ConnectionManager, AsyncCommands, RedisError};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use common::{AppResult, CacheConfig};

/// Cache key prefix for rate limiting
const CACHE_PREFIX_RATE_LIMIT: &str = "rate_limit:";

enum Backend {
    Redis(ConnectionManager),
    Memory(Mutex<HashMap<String, Window>>),
}

struct Window {
    count: u64,
    resets_at: Instant,
}

/// Cache shared by the middleware and the session store.
pub struct Cache {
    backend: Backend,
}

impl Cache {
    /// Connect to Redis.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        debug!("Connecting to Redis");
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            backend: Backend::Redis(conn),
        })
    }

    /// Process-local cache.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(HashMap::new())),
        }
    }

    /// Redis when configured and reachable, memory otherwise.
    pub async fn from_config(config: &CacheConfig) -> Self {
        match &config.url {
            Some(url) => match Self::connect(url).await {
                Ok(cache) => {
                    tracing::info!("Redis cache connected");
                    cache
                }
                Err(e) => {
                    warn!("Redis unavailable ({}), falling back to in-memory cache", e);
                    Self::in_memory()
                }
            },
            None => {
                tracing::info!("REDIS_URL not set, using in-memory cache");
                Self::in_memory()
            }
        }
    }

    /// Redis connection, if this cache is Redis-backed.
    pub fn connection(&self) -> Option<ConnectionManager> {
        match &self.backend {
            Backend::Redis(conn) => Some(conn.clone()),
            Backend::Memory(_) => None,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Backend::Redis(_) => "redis",
            Backend::Memory(_) => "memory",
        }
    }

    /// Check the backend is reachable.
    pub async fn ping(&self) -> AppResult<()> {
        match &self.backend {
            Backend::Redis(conn) => {
                let mut conn = conn.clone();
                let _: String = redis::cmd("PING").query_async(&mut conn).await?;
                Ok(())
            }
            Backend::Memory(_) => Ok(()),
        }
    }

    // =========================================================================
    // Rate Limiting
    // =========================================================================

    /// Check rate limit and increment counter.
    /// Returns (current_count, allowed).
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);

        let count = match &self.backend {
            Backend::Redis(conn) => {
                let mut conn = conn.clone();
                let count: u64 = conn.incr(&key, 1).await?;
                // Set expiry on first request
                if count == 1 {
                    let _: () = conn.expire(&key, window_seconds as i64).await?;
                }
                count
            }
            Backend::Memory(windows) => {
                let now = Instant::now();
                let mut windows = windows.lock().await;
                windows.retain(|_, window| window.resets_at > now);
                let window = windows.entry(key).or_insert_with(|| Window {
                    count: 0,
                    resets_at: now + Duration::from_secs(window_seconds),
                });
                window.count += 1;
                window.count
            }
        };

        Ok((count, count <= max_requests))
    }

    /// Seconds until the rate limit window of `identifier` resets.
    pub async fn rate_limit_ttl(&self, identifier: &str) -> AppResult<Option<u64>> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        match &self.backend {
            Backend::Redis(conn) => {
                let mut conn = conn.clone();
                let ttl: i64 = conn.ttl(&key).await?;
                Ok(u64::try_from(ttl).ok())
            }
            Backend::Memory(windows) => {
                let windows = windows.lock().await;
                Ok(windows.get(&key).map(|window| {
                    window
                        .resets_at
                        .saturating_duration_since(Instant::now())
                        .as_secs()
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_rate_limit_counts_per_identifier() {
        let cache = Cache::in_memory();
        assert_eq!(cache.check_rate_limit("a", 2, 60).await.unwrap(), (1, true));
        assert_eq!(cache.check_rate_limit("a", 2, 60).await.unwrap(), (2, true));
        assert_eq!(cache.check_rate_limit("a", 2, 60).await.unwrap(), (3, false));
        assert_eq!(cache.check_rate_limit("b", 2, 60).await.unwrap(), (1, true));

        let ttl = cache.rate_limit_ttl("a").await.unwrap().unwrap();
        assert!(ttl <= 60);
        assert!(cache.connection().is_none());
        cache.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_window_resets() {
        let cache = Cache::in_memory();
        assert_eq!(cache.check_rate_limit("k", 1, 0).await.unwrap(), (1, true));
        // zero-length window has already expired
        assert_eq!(cache.check_rate_limit("k", 1, 0).await.unwrap(), (1, true));
    }
}
