//! Moderation service - admins hide and restore diary entries.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{Diary, DiaryStatus, NotificationKind, Paginated, PaginationParams};

use crate::repository::DiaryRepository;
use crate::service::NotificationService;

#[async_trait]
pub trait ModerationService: Send + Sync {
    /// Entries across all authors, optionally filtered by status
    async fn list_diaries(
        &self,
        status: Option<DiaryStatus>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Diary>>;

    /// Hide an entry from everyone but its author and admins
    async fn hide_diary(&self, id: Uuid, reason: Option<String>) -> AppResult<Diary>;

    /// Publish a hidden entry again
    async fn restore_diary(&self, id: Uuid) -> AppResult<Diary>;
}

pub struct Moderator {
    diaries: Arc<dyn DiaryRepository>,
    notifications: Arc<dyn NotificationService>,
}

impl Moderator {
    pub fn new(
        diaries: Arc<dyn DiaryRepository>,
        notifications: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            diaries,
            notifications,
        }
    }
}

#[async_trait]
impl ModerationService for Moderator {
    async fn list_diaries(
        &self,
        status: Option<DiaryStatus>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Diary>> {
        self.diaries.list_all(status, params).await
    }

    async fn hide_diary(&self, id: Uuid, reason: Option<String>) -> AppResult<Diary> {
        let diary = self.diaries.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        if diary.is_hidden() {
            return Err(AppError::validation("Diary entry is already hidden"));
        }

        let diary = self.diaries.set_status(id, DiaryStatus::Hidden).await?;
        let body = match reason.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            Some(reason) => format!(
                "Your entry \"{}\" was hidden by a moderator. Reason: {}",
                diary.title, reason
            ),
            None => format!("Your entry \"{}\" was hidden by a moderator.", diary.title),
        };
        self.notifications
            .notify(
                diary.author_id,
                NotificationKind::Moderation,
                "Entry hidden".to_string(),
                body,
            )
            .await?;

        tracing::info!(diary_id = %id, author_id = %diary.author_id, "Diary entry hidden");
        Ok(diary)
    }

    async fn restore_diary(&self, id: Uuid) -> AppResult<Diary> {
        let diary = self.diaries.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        if !diary.is_hidden() {
            return Err(AppError::validation("Diary entry is not hidden"));
        }

        let diary = self.diaries.set_status(id, DiaryStatus::Published).await?;
        self.notifications
            .notify(
                diary.author_id,
                NotificationKind::Moderation,
                "Entry restored".to_string(),
                format!("Your entry \"{}\" is visible again.", diary.title),
            )
            .await?;

        tracing::info!(diary_id = %id, author_id = %diary.author_id, "Diary entry restored");
        Ok(diary)
    }
}
