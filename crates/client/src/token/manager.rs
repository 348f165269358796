//! Session lifecycle: proactive refresh, single-flight refresh and expiry.
//!
//! Every replacement of the token pair bumps a generation counter. A caller
//! that saw its request rejected passes the generation it used to
//! [`TokenManager::refresh_after`]; if the counter has moved on by the time
//! it holds the refresh lock, somebody else already refreshed and the
//! current token is returned without another network call.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use domain::TokenPair;

use super::claims::TokenInfo;
use super::refresher::TokenRefresher;
use super::store::TokenStore;
use crate::error::{ClientError, ClientResult};

/// What the rest of the application is told about the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    Active { expires_at: DateTime<Utc> },
    /// The server refused the refresh token; the user must sign in again.
    Expired,
}

struct Session {
    tokens: TokenPair,
    access: TokenInfo,
    refresh_expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    session: Option<Session>,
    generation: u64,
}

/// Owns the token pair and keeps it fresh.
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    leeway: Duration,
    inner: RwLock<Inner>,
    refresh_lock: Mutex<()>,
    state_tx: watch::Sender<SessionState>,
    scheduled: StdMutex<Option<JoinHandle<()>>>,
    this: Weak<TokenManager>,
}

/// How long to wait before refreshing proactively.
///
/// Refreshes `lead = min(leeway, remaining / 2)` before expiry so short-lived
/// tokens are not refreshed the moment they arrive.
pub(crate) fn refresh_delay(access: &TokenInfo, leeway: Duration, now: DateTime<Utc>) -> Duration {
    let remaining = access.remaining(now);
    let lead = leeway.min(remaining / 2);
    remaining - lead
}

impl TokenManager {
    pub fn new(
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        leeway: Duration,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(SessionState::SignedOut);
        Arc::new_cyclic(|this| Self {
            store,
            refresher,
            leeway,
            inner: RwLock::new(Inner::default()),
            refresh_lock: Mutex::new(()),
            state_tx,
            scheduled: StdMutex::new(None),
            this: this.clone(),
        })
    }

    /// Watch session transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// Load a previous session from the store.
    ///
    /// Returns false when there is none or its refresh token has expired.
    pub async fn restore(&self) -> ClientResult<bool> {
        let Some(tokens) = self.store.load().await? else {
            return Ok(false);
        };

        let usable = TokenInfo::parse(&tokens.refresh_token)
            .map(|refresh| !refresh.is_expired(Utc::now(), Duration::ZERO))
            .unwrap_or(false);
        if !usable {
            debug!("Discarding stored session with an unusable refresh token");
            self.store.clear().await?;
            return Ok(false);
        }

        self.install(tokens, false).await?;
        Ok(true)
    }

    /// Replace the session with a freshly issued pair.
    pub async fn set_tokens(&self, tokens: TokenPair) -> ClientResult<()> {
        self.install(tokens, true).await.map(|_| ())
    }

    /// Sign out locally.
    pub async fn clear(&self) -> ClientResult<()> {
        self.end(SessionState::SignedOut).await
    }

    /// The current refresh token, if signed in.
    pub async fn refresh_token(&self) -> Option<String> {
        let inner = self.inner.read().await;
        inner
            .session
            .as_ref()
            .map(|session| session.tokens.refresh_token.clone())
    }

    /// Claims of the current access token, if signed in.
    pub async fn access_info(&self) -> Option<TokenInfo> {
        let inner = self.inner.read().await;
        inner.session.as_ref().map(|session| session.access.clone())
    }

    /// Access token and its generation, refreshed first when it is about
    /// to expire.
    pub async fn access_token(&self) -> ClientResult<(String, u64)> {
        let (token, generation, stale, expired) = {
            let inner = self.inner.read().await;
            let session = inner.session.as_ref().ok_or_else(|| self.missing_session())?;
            let now = Utc::now();
            (
                session.tokens.access_token.clone(),
                inner.generation,
                session.access.is_expired(now, self.leeway),
                session.access.is_expired(now, Duration::ZERO),
            )
        };

        if !stale {
            return Ok((token, generation));
        }

        debug!("Access token about to expire, refreshing");
        match self.refresh_after(generation).await {
            Ok(fresh) => Ok(fresh),
            // A transient failure is survivable while the old token still works
            Err(e) if !expired && !matches!(e, ClientError::SessionExpired) => {
                warn!("Refresh failed, using current access token: {}", e);
                Ok((token, generation))
            }
            Err(e) => Err(e),
        }
    }

    /// Refresh unless the session changed since `observed` was read.
    pub async fn refresh_after(&self, observed: u64) -> ClientResult<(String, u64)> {
        let _guard = self.refresh_lock.lock().await;

        let (refresh_token, refresh_expired) = {
            let inner = self.inner.read().await;
            let session = inner.session.as_ref().ok_or_else(|| self.missing_session())?;
            if inner.generation != observed {
                debug!("Session already refreshed by another caller");
                return Ok((session.tokens.access_token.clone(), inner.generation));
            }
            (
                session.tokens.refresh_token.clone(),
                session.refresh_expires_at <= Utc::now(),
            )
        };

        if refresh_expired {
            info!("Refresh token expired, signing out");
            self.end(SessionState::Expired).await?;
            return Err(ClientError::SessionExpired);
        }

        match self.refresher.refresh(&refresh_token).await {
            Ok(tokens) => {
                debug!("Session refreshed");
                self.install(tokens, true).await
            }
            Err(e) if e.is_refresh_rejection() => {
                warn!("Refresh token rejected, signing out: {}", e);
                self.end(SessionState::Expired).await?;
                Err(ClientError::SessionExpired)
            }
            Err(e) => {
                warn!("Token refresh failed, keeping current session: {}", e);
                Err(e)
            }
        }
    }

    fn missing_session(&self) -> ClientError {
        match *self.state_tx.borrow() {
            SessionState::Expired => ClientError::SessionExpired,
            _ => ClientError::NotAuthenticated,
        }
    }

    async fn install(&self, tokens: TokenPair, persist: bool) -> ClientResult<(String, u64)> {
        let access = TokenInfo::parse(&tokens.access_token)?;
        let refresh = TokenInfo::parse(&tokens.refresh_token)?;
        if persist {
            self.store.save(&tokens).await?;
        }

        let access_token = tokens.access_token.clone();
        let expires_at = access.expires_at;
        let generation = {
            let mut inner = self.inner.write().await;
            inner.generation += 1;
            inner.session = Some(Session {
                tokens,
                access: access.clone(),
                refresh_expires_at: refresh.expires_at,
            });
            inner.generation
        };

        self.state_tx.send_replace(SessionState::Active { expires_at });
        // Last: this may abort the task we are running on
        self.schedule(generation, &access);
        Ok((access_token, generation))
    }

    async fn end(&self, state: SessionState) -> ClientResult<()> {
        {
            let mut inner = self.inner.write().await;
            inner.session = None;
            inner.generation += 1;
        }
        self.state_tx.send_replace(state);
        let cleared = self.store.clear().await;
        // Last: this may abort the task we are running on
        self.cancel_scheduled();
        cleared
    }

    fn schedule(&self, generation: u64, access: &TokenInfo) {
        let delay = refresh_delay(access, self.leeway, Utc::now());
        debug!(delay_secs = delay.as_secs(), generation, "Scheduling proactive refresh");

        let manager = self.this.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(manager) = manager.upgrade() else {
                return;
            };
            if let Err(e) = manager.refresh_after(generation).await {
                debug!("Proactive refresh failed: {}", e);
            }
        });

        if let Some(previous) = self.scheduled().replace(task) {
            previous.abort();
        }
    }

    fn cancel_scheduled(&self) {
        if let Some(task) = self.scheduled().take() {
            task.abort();
        }
    }

    fn scheduled(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.scheduled.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TokenManager {
    fn drop(&mut self) {
        let slot = self
            .scheduled
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::claims::tests::make_token;
    use crate::token::refresher::MockTokenRefresher;
    use crate::token::store::MemoryTokenStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LEEWAY: Duration = Duration::from_secs(60);

    fn pair(access_ttl: i64) -> TokenPair {
        TokenPair::bearer(
            make_token("access", access_ttl),
            make_token("refresh", 7 * 86_400),
            access_ttl,
            7 * 86_400,
        )
    }

    /// Counts calls and answers slowly so concurrent callers overlap.
    #[derive(Default)]
    struct CountingRefresher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenRefresher for CountingRefresher {
        async fn refresh(&self, _refresh_token: &str) -> ClientResult<TokenPair> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(pair(900))
        }
    }

    fn rejecting(status: u16) -> MockTokenRefresher {
        let mut refresher = MockTokenRefresher::new();
        refresher.expect_refresh().times(1).returning(move |_| {
            Err(ClientError::Api {
                status,
                code: "UNAUTHORIZED".to_string(),
                message: "Authentication required".to_string(),
            })
        });
        refresher
    }

    #[tokio::test]
    async fn test_set_tokens_persists_and_publishes() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut refresher = MockTokenRefresher::new();
        refresher.expect_refresh().times(0);
        let manager = TokenManager::new(store.clone(), Arc::new(refresher), LEEWAY);
        assert_eq!(manager.state(), SessionState::SignedOut);

        let tokens = pair(900);
        manager.set_tokens(tokens.clone()).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(tokens.clone()));
        assert!(matches!(manager.state(), SessionState::Active { .. }));
        let (access, _) = manager.access_token().await.unwrap();
        assert_eq!(access, tokens.access_token);
    }

    #[tokio::test]
    async fn test_access_token_requires_session() {
        let manager = TokenManager::new(
            Arc::new(MemoryTokenStore::new()),
            Arc::new(MockTokenRefresher::new()),
            LEEWAY,
        );
        assert!(matches!(
            manager.access_token().await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_request() {
        let refresher = Arc::new(CountingRefresher::default());
        let manager = TokenManager::new(
            Arc::new(MemoryTokenStore::new()),
            refresher.clone(),
            LEEWAY,
        );
        manager.set_tokens(pair(900)).await.unwrap();
        let (old_token, generation) = manager.access_token().await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager.refresh_after(generation).await
            }));
        }

        let mut tokens = Vec::new();
        for handle in handles {
            tokens.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        let (first, first_generation) = &tokens[0];
        assert_ne!(first, &old_token);
        assert!(tokens
            .iter()
            .all(|(token, gen)| token == first && gen == first_generation));
    }

    #[tokio::test]
    async fn test_access_token_refreshes_inside_leeway() {
        let refresher = Arc::new(CountingRefresher::default());
        let manager = TokenManager::new(
            Arc::new(MemoryTokenStore::new()),
            refresher.clone(),
            LEEWAY,
        );
        let stale = pair(30);
        manager.set_tokens(stale.clone()).await.unwrap();

        let (token, _) = manager.access_token().await.unwrap();

        assert_ne!(token, stale.access_token);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_refresh_expires_session() {
        let store = Arc::new(MemoryTokenStore::new());
        let manager = TokenManager::new(store.clone(), Arc::new(rejecting(401)), LEEWAY);
        manager.set_tokens(pair(900)).await.unwrap();
        let (_, generation) = manager.access_token().await.unwrap();

        let result = manager.refresh_after(generation).await;

        assert!(matches!(result, Err(ClientError::SessionExpired)));
        assert_eq!(manager.state(), SessionState::Expired);
        assert!(store.load().await.unwrap().is_none());
        assert!(matches!(
            manager.access_token().await,
            Err(ClientError::SessionExpired)
        ));
    }

    #[tokio::test]
    async fn test_transient_refresh_failure_keeps_session() {
        let store = Arc::new(MemoryTokenStore::new());
        let manager = TokenManager::new(store.clone(), Arc::new(rejecting(503)), LEEWAY);
        let tokens = pair(900);
        manager.set_tokens(tokens.clone()).await.unwrap();
        let (_, generation) = manager.access_token().await.unwrap();

        let result = manager.refresh_after(generation).await;

        assert!(matches!(result, Err(ClientError::Api { status: 503, .. })));
        assert!(matches!(manager.state(), SessionState::Active { .. }));
        assert_eq!(store.load().await.unwrap(), Some(tokens.clone()));
        assert_eq!(manager.access_token().await.unwrap().0, tokens.access_token);
    }

    #[tokio::test]
    async fn test_restore_skips_expired_refresh_token() {
        let store = Arc::new(MemoryTokenStore::new());
        let expired = TokenPair::bearer(
            make_token("access", -120),
            make_token("refresh", -60),
            900,
            604_800,
        );
        store.save(&expired).await.unwrap();
        let manager = TokenManager::new(store.clone(), Arc::new(MockTokenRefresher::new()), LEEWAY);

        assert!(!manager.restore().await.unwrap());
        assert!(store.load().await.unwrap().is_none());
        assert_eq!(manager.state(), SessionState::SignedOut);

        let tokens = pair(900);
        store.save(&tokens).await.unwrap();
        assert!(manager.restore().await.unwrap());
        assert_eq!(manager.refresh_token().await, Some(tokens.refresh_token));
    }

    #[tokio::test]
    async fn test_proactive_refresh_fires_before_expiry() {
        let refresher = Arc::new(CountingRefresher::default());
        let manager = TokenManager::new(
            Arc::new(MemoryTokenStore::new()),
            refresher.clone(),
            LEEWAY,
        );
        let mut states = manager.subscribe();
        manager.set_tokens(pair(2)).await.unwrap();
        let short_expiry = manager.access_info().await.unwrap().expires_at;

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                states.changed().await.unwrap();
                if let SessionState::Active { expires_at } = *states.borrow() {
                    if expires_at > short_expiry {
                        break;
                    }
                }
            }
        })
        .await
        .expect("proactive refresh did not happen");

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }

    /// Wait past the expiry of a `pair(2)` session.
    async fn outlive_short_session() {
        tokio::time::sleep(Duration::from_millis(2500)).await;
    }

    #[tokio::test]
    async fn test_clear_cancels_proactive_refresh() {
        let refresher = Arc::new(CountingRefresher::default());
        let manager = TokenManager::new(
            Arc::new(MemoryTokenStore::new()),
            refresher.clone(),
            LEEWAY,
        );
        manager.set_tokens(pair(2)).await.unwrap();

        manager.clear().await.unwrap();
        outlive_short_session().await;

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(manager.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_new_tokens_replace_scheduled_refresh() {
        let refresher = Arc::new(CountingRefresher::default());
        let manager = TokenManager::new(
            Arc::new(MemoryTokenStore::new()),
            refresher.clone(),
            LEEWAY,
        );
        manager.set_tokens(pair(2)).await.unwrap();

        let long = pair(3600);
        manager.set_tokens(long.clone()).await.unwrap();
        outlive_short_session().await;

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(manager.refresh_token().await, Some(long.refresh_token));
    }

    #[tokio::test]
    async fn test_scheduled_refresh_does_not_keep_manager_alive() {
        let refresher = Arc::new(CountingRefresher::default());
        let manager = TokenManager::new(
            Arc::new(MemoryTokenStore::new()),
            refresher.clone(),
            LEEWAY,
        );
        manager.set_tokens(pair(2)).await.unwrap();
        assert_eq!(Arc::strong_count(&manager), 1);

        drop(manager);
        outlive_short_session().await;

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_clear_signs_out() {
        let store = Arc::new(MemoryTokenStore::new());
        let manager = TokenManager::new(store.clone(), Arc::new(MockTokenRefresher::new()), LEEWAY);
        manager.set_tokens(pair(900)).await.unwrap();

        manager.clear().await.unwrap();

        assert_eq!(manager.state(), SessionState::SignedOut);
        assert!(store.load().await.unwrap().is_none());
        assert!(matches!(
            manager.access_token().await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_refresh_delay_lead() {
        let now = Utc::now();
        let info = |secs: i64| TokenInfo {
            subject: None,
            role: None,
            kind: None,
            issued_at: None,
            expires_at: now + chrono::Duration::seconds(secs),
        };

        // long-lived: refresh one leeway early
        assert_eq!(refresh_delay(&info(900), LEEWAY, now), Duration::from_secs(840));
        // short-lived: refresh halfway
        assert_eq!(refresh_delay(&info(60), LEEWAY, now), Duration::from_secs(30));
        // already expired: refresh now
        assert_eq!(refresh_delay(&info(-5), LEEWAY, now), Duration::ZERO);
    }
}
