//! Application state for dependency injection.

use std::sync::Arc;

use auth_service_lib::{AuthService, Authenticator, MemorySessionStore, RedisSessionStore, SessionStore};
use diary_service_lib::infra::Database;
use diary_service_lib::repository::{DiaryStore, NotificationStore, SiteConfigStore, UserStore};
use diary_service_lib::service::{
    DiaryManager, DiaryService, ModerationService, Moderator, NotificationManager,
    NotificationService, SiteConfigManager, SiteConfigService, UserManager, UserService,
};

use crate::config::AppConfig;
use crate::middleware::Cache;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthService>,
    pub users: Arc<dyn UserService>,
    pub diaries: Arc<dyn DiaryService>,
    pub notifications: Arc<dyn NotificationService>,
    pub site_config: Arc<dyn SiteConfigService>,
    pub moderation: Arc<dyn ModerationService>,
    pub cache: Arc<Cache>,
    pub database: Database,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire repositories and services over one database connection.
    ///
    /// Refresh sessions live in Redis when the cache has a connection and
    /// in process memory otherwise.
    pub fn new(database: Database, cache: Arc<Cache>, config: AppConfig) -> Self {
        let conn = database.get_connection();
        let user_repo = Arc::new(UserStore::new(conn.clone()));
        let diary_repo = Arc::new(DiaryStore::new(conn.clone()));
        let site_config_repo = Arc::new(SiteConfigStore::new(conn.clone()));
        let notification_repo = Arc::new(NotificationStore::new(conn));

        let sessions: Arc<dyn SessionStore> = match cache.connection() {
            Some(connection) => Arc::new(RedisSessionStore::new(connection)),
            None => Arc::new(MemorySessionStore::new()),
        };

        let notifications: Arc<dyn NotificationService> =
            Arc::new(NotificationManager::new(notification_repo));

        Self {
            auth: Arc::new(Authenticator::new(
                user_repo.clone(),
                site_config_repo.clone(),
                sessions,
                &config.jwt,
            )),
            users: Arc::new(UserManager::new(user_repo)),
            diaries: Arc::new(DiaryManager::new(diary_repo.clone(), site_config_repo.clone())),
            moderation: Arc::new(Moderator::new(diary_repo, notifications.clone())),
            notifications,
            site_config: Arc::new(SiteConfigManager::new(site_config_repo)),
            cache,
            database,
            config: Arc::new(config),
        }
    }
}
