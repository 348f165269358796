//! Authentication service - Handles user authentication and authorization.
//!
//! Access tokens are short-lived and stateless. Refresh tokens are tracked
//! by `jti` in a [`SessionStore`] and rotated on every use; presenting a
//! refresh token that was already consumed revokes all of that user's
//! sessions.

use async_trait::async_trait;
use std::sync::Arc;

use common::{AppError, AppResult, JwtCodec, JwtConfig};
use diary_service_lib::repository::{SiteConfigRepository, UserRepository};
use domain::password::DUMMY_PASSWORD_HASH;
use domain::{Claims, Password, TokenKind, TokenPair, User, MIN_NAME_LENGTH};

use crate::session::SessionStore;

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user
    async fn register(&self, email: String, password: String, name: String) -> AppResult<User>;

    /// Login and return a token pair
    async fn login(&self, email: String, password: String) -> AppResult<TokenPair>;

    /// Exchange a refresh token for a new pair
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;

    /// Revoke a refresh token
    async fn logout(&self, refresh_token: &str) -> AppResult<()>;

    /// Verify an access token and extract claims
    fn verify_access(&self, token: &str) -> AppResult<Claims>;
}

/// Concrete implementation of AuthService.
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    site_config: Arc<dyn SiteConfigRepository>,
    sessions: Arc<dyn SessionStore>,
    codec: JwtCodec,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Authenticator {
    /// Create new auth service instance
    pub fn new(
        users: Arc<dyn UserRepository>,
        site_config: Arc<dyn SiteConfigRepository>,
        sessions: Arc<dyn SessionStore>,
        jwt: &JwtConfig,
    ) -> Self {
        Self {
            users,
            site_config,
            sessions,
            codec: JwtCodec::new(jwt),
            access_ttl_seconds: jwt.access_ttl_seconds(),
            refresh_ttl_seconds: jwt.refresh_ttl_seconds(),
        }
    }

    /// Issue an access/refresh pair and record the refresh token.
    async fn issue_pair(&self, user: &User) -> AppResult<TokenPair> {
        let (access_token, _) = self
            .codec
            .issue(user, TokenKind::Access, self.access_ttl_seconds)?;
        let (refresh_token, refresh) = self
            .codec
            .issue(user, TokenKind::Refresh, self.refresh_ttl_seconds)?;

        self.sessions
            .save(refresh.jti, user.id, self.refresh_ttl_seconds as u64)
            .await?;

        Ok(TokenPair::bearer(
            access_token,
            refresh_token,
            self.access_ttl_seconds,
            self.refresh_ttl_seconds,
        ))
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register(&self, email: String, password: String, name: String) -> AppResult<User> {
        if !self.site_config.get().await?.registration_open {
            return Err(AppError::Forbidden);
        }

        let email = normalize_email(&email);
        let name = name.trim().to_string();
        if name.chars().count() < MIN_NAME_LENGTH {
            return Err(AppError::validation("Name is required"));
        }

        // Disabled accounts keep their email reserved
        if self
            .users
            .find_by_email_with_deleted(&email)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("User"));
        }

        let password_hash = Password::new(&password)?.into_string();
        let user = self.users.create(email, password_hash, name).await?;

        // The first account administers the site
        if let Some(admin) = self.users.promote_first_admin(user.id).await? {
            tracing::info!(user_id = %admin.id, "First user registered as admin");
            return Ok(admin);
        }

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    async fn login(&self, email: String, password: String) -> AppResult<TokenPair> {
        let user_result = self.users.find_by_email(&normalize_email(&email)).await?;

        // Verify against a dummy hash when the user is unknown so both paths
        // take the same time.
        let password_hash = user_result
            .as_ref()
            .map(|user| user.password_hash.as_str())
            .unwrap_or(DUMMY_PASSWORD_HASH);
        let password_valid = Password::from_hash(password_hash).verify(&password);

        match user_result {
            Some(user) if password_valid => {
                tracing::debug!(user_id = %user.id, "Login succeeded");
                self.issue_pair(&user).await
            }
            _ => Err(AppError::InvalidCredentials),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.codec.verify(refresh_token, TokenKind::Refresh)?;

        match self.sessions.take(claims.jti).await? {
            Some(owner) if owner == claims.sub => {}
            _ => {
                // A valid signature with no live session means the token was
                // already rotated or revoked.
                let revoked = self.sessions.revoke_all(claims.sub).await?;
                tracing::warn!(
                    user_id = %claims.sub,
                    revoked,
                    "Refresh token reuse detected, all sessions revoked"
                );
                return Err(AppError::Unauthorized);
            }
        }

        // Fresh user data so a changed role or a ban takes effect
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        self.issue_pair(&user).await
    }

    async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        match self.codec.verify(refresh_token, TokenKind::Refresh) {
            Ok(claims) => {
                self.sessions.revoke(claims.jti).await?;
                tracing::debug!(user_id = %claims.sub, "Session revoked");
            }
            Err(e) => tracing::debug!("Ignoring logout with unusable token: {}", e),
        }
        Ok(())
    }

    fn verify_access(&self, token: &str) -> AppResult<Claims> {
        self.codec.verify(token, TokenKind::Access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, MockSessionStore};
    use diary_service_lib::repository::{MockSiteConfigRepository, MockUserRepository};
    use domain::SiteConfig;
    use uuid::Uuid;

    const SECRET: &str = "unit-test-secret-key-with-32-chars!";

    fn jwt() -> JwtConfig {
        JwtConfig::new(SECRET, 15, 7).unwrap()
    }

    fn open_site() -> MockSiteConfigRepository {
        let mut repo = MockSiteConfigRepository::new();
        repo.expect_get().returning(|| Ok(SiteConfig::default()));
        repo
    }

    fn stored_user(password: &str) -> User {
        User::new(
            Uuid::new_v4(),
            "reader@example.com".to_string(),
            Password::new(password).unwrap().into_string(),
            "Reader".to_string(),
        )
    }

    fn authenticator(users: MockUserRepository, sessions: Arc<dyn SessionStore>) -> Authenticator {
        Authenticator::new(Arc::new(users), Arc::new(open_site()), sessions, &jwt())
    }

    #[tokio::test]
    async fn test_register_closed_site_is_forbidden() {
        let mut site = MockSiteConfigRepository::new();
        site.expect_get().returning(|| {
            Ok(SiteConfig {
                registration_open: false,
                ..Default::default()
            })
        });
        let mut users = MockUserRepository::new();
        users.expect_create().never();

        let auth = Authenticator::new(
            Arc::new(users),
            Arc::new(site),
            Arc::new(MemorySessionStore::new()),
            &jwt(),
        );
        let result = auth
            .register("a@example.com".into(), "password123".into(), "A".into())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_register_existing_email_conflicts() {
        let existing = stored_user("password123");
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email_with_deleted()
            .withf(|email| email == "reader@example.com")
            .returning(move |_| Ok(Some(existing.clone())));
        users.expect_create().never();

        let auth = authenticator(users, Arc::new(MemorySessionStore::new()));
        let result = auth
            .register(" Reader@Example.com ".into(), "password123".into(), "R".into())
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_promotes_only_when_repository_allows() {
        for promote in [false, true] {
            let mut users = MockUserRepository::new();
            users
                .expect_find_by_email_with_deleted()
                .returning(|_| Ok(None));
            users
                .expect_create()
                .withf(|email, _, name| email == "new@example.com" && name == "New")
                .returning(|email, hash, name| Ok(User::new(Uuid::new_v4(), email, hash, name)));
            users
                .expect_promote_first_admin()
                .times(1)
                .returning(move |id| {
                    Ok(promote.then(|| {
                        let mut admin = stored_user("password123");
                        admin.id = id;
                        admin.role = domain::UserRole::Admin;
                        admin
                    }))
                });
            users.expect_update().never();

            let auth = authenticator(users, Arc::new(MemorySessionStore::new()));
            let user = auth
                .register("New@example.com".into(), "password123".into(), " New ".into())
                .await
                .unwrap();
            assert_eq!(user.is_admin(), promote);
        }
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_invalid_credentials() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let auth = authenticator(users, Arc::new(MemorySessionStore::new()));
        let result = auth
            .login("ghost@example.com".into(), "password123".into())
            .await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_issues_pair_and_records_session() {
        let user = stored_user("password123");
        let found = user.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(found.clone())));

        let sessions = Arc::new(MemorySessionStore::new());
        let auth = authenticator(users, sessions.clone());

        let pair = auth
            .login("reader@example.com".into(), "password123".into())
            .await
            .unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 900);
        assert_eq!(sessions.len().await, 1);

        let claims = auth.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
        // the refresh token is not an access token
        assert!(auth.verify_access(&pair.refresh_token).is_err());

        assert!(matches!(
            auth.login("reader@example.com".into(), "wrong-password".into())
                .await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_detects_reuse() {
        let user = stored_user("password123");
        let found = user.clone();
        let by_id = user.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(found.clone())));
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(by_id.clone())));

        let sessions = Arc::new(MemorySessionStore::new());
        let auth = authenticator(users, sessions.clone());
        let first = auth
            .login("reader@example.com".into(), "password123".into())
            .await
            .unwrap();

        let second = auth.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);
        assert_eq!(sessions.len().await, 1);

        // replaying the consumed token kills the rotated session as well
        assert!(matches!(
            auth.refresh(&first.refresh_token).await,
            Err(AppError::Unauthorized)
        ));
        assert!(sessions.is_empty().await);
        assert!(auth.refresh(&second.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_for_disabled_user_is_unauthorized() {
        let user = stored_user("password123");
        let found = user.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(found.clone())));
        users.expect_find_by_id().returning(|_| Ok(None));

        let auth = authenticator(users, Arc::new(MemorySessionStore::new()));
        let pair = auth
            .login("reader@example.com".into(), "password123".into())
            .await
            .unwrap();
        assert!(matches!(
            auth.refresh(&pair.refresh_token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let mut sessions = MockSessionStore::new();
        sessions.expect_take().never();
        sessions.expect_save().returning(|_, _, _| Ok(()));

        let user = stored_user("password123");
        let found = user.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(found.clone())));

        let auth = authenticator(users, Arc::new(sessions));
        let pair = auth
            .login("reader@example.com".into(), "password123".into())
            .await
            .unwrap();
        assert!(auth.refresh(&pair.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_and_ignores_garbage() {
        let user = stored_user("password123");
        let found = user.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(found.clone())));

        let sessions = Arc::new(MemorySessionStore::new());
        let auth = authenticator(users, sessions.clone());
        let pair = auth
            .login("reader@example.com".into(), "password123".into())
            .await
            .unwrap();

        auth.logout(&pair.refresh_token).await.unwrap();
        auth.logout(&pair.refresh_token).await.unwrap();
        auth.logout("not-a-jwt").await.unwrap();
        assert!(sessions.is_empty().await);
    }
}
