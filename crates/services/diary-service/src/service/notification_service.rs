//! Notification service.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::AppResult;
use domain::{Notification, NotificationKind, Paginated, PaginationParams};

use crate::repository::NotificationRepository;

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        params: PaginationParams,
    ) -> AppResult<Paginated<Notification>>;

    async fn unread_count(&self, user_id: Uuid) -> AppResult<u64>;

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> AppResult<Notification>;

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64>;

    /// Deliver a notification to a user
    async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: String,
        body: String,
    ) -> AppResult<Notification>;
}

pub struct NotificationManager {
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationManager {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl NotificationService for NotificationManager {
    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        params: PaginationParams,
    ) -> AppResult<Paginated<Notification>> {
        self.repo.list_for_user(user_id, unread_only, params).await
    }

    async fn unread_count(&self, user_id: Uuid) -> AppResult<u64> {
        self.repo.unread_count(user_id).await
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> AppResult<Notification> {
        self.repo.mark_read(user_id, id).await
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        self.repo.mark_all_read(user_id).await
    }

    async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: String,
        body: String,
    ) -> AppResult<Notification> {
        let notification = self.repo.create(user_id, kind, title, body).await?;
        tracing::debug!(user_id = %user_id, kind = kind.as_str(), "Notification delivered");
        Ok(notification)
    }
}
