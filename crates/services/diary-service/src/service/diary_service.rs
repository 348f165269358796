//! Diary service - entry CRUD with visibility and ownership rules.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{CreateDiary, Diary, Paginated, PaginationParams, UpdateDiary};

use crate::repository::{DiaryRepository, SiteConfigRepository};

/// Diary service trait for dependency injection.
#[async_trait]
pub trait DiaryService: Send + Sync {
    /// Write a new entry
    async fn create(&self, author_id: Uuid, input: CreateDiary) -> AppResult<Diary>;

    /// Read an entry the viewer is allowed to see.
    ///
    /// Entries the viewer may not see are reported as not found.
    async fn get(&self, viewer_id: Uuid, viewer_is_admin: bool, id: Uuid) -> AppResult<Diary>;

    /// Update one of the author's own entries
    async fn update(&self, author_id: Uuid, id: Uuid, patch: UpdateDiary) -> AppResult<Diary>;

    /// Delete one of the author's own entries
    async fn delete(&self, author_id: Uuid, id: Uuid) -> AppResult<()>;

    /// The author's own entries, newest first
    async fn list_mine(&self, author_id: Uuid, params: PaginationParams)
        -> AppResult<Paginated<Diary>>;

    /// Public, published entries of all authors
    async fn public_feed(&self, params: PaginationParams) -> AppResult<Paginated<Diary>>;
}

pub struct DiaryManager {
    diaries: Arc<dyn DiaryRepository>,
    site_config: Arc<dyn SiteConfigRepository>,
}

impl DiaryManager {
    pub fn new(
        diaries: Arc<dyn DiaryRepository>,
        site_config: Arc<dyn SiteConfigRepository>,
    ) -> Self {
        Self {
            diaries,
            site_config,
        }
    }

    async fn max_entry_length(&self) -> AppResult<u32> {
        Ok(self.site_config.get().await?.max_entry_length)
    }

    /// Load an entry for modification by its author.
    async fn owned(&self, author_id: Uuid, id: Uuid) -> AppResult<Diary> {
        let diary = self.diaries.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        if diary.is_owned_by(author_id) {
            return Ok(diary);
        }
        // Only reveal existence when the caller could read the entry anyway
        if diary.can_view(author_id, false) {
            Err(AppError::Forbidden)
        } else {
            Err(AppError::NotFound)
        }
    }
}

#[async_trait]
impl DiaryService for DiaryManager {
    async fn create(&self, author_id: Uuid, input: CreateDiary) -> AppResult<Diary> {
        input.validate(self.max_entry_length().await?)?;
        let diary = self.diaries.create(author_id, input).await?;
        tracing::debug!(diary_id = %diary.id, author_id = %author_id, "Diary entry created");
        Ok(diary)
    }

    async fn get(&self, viewer_id: Uuid, viewer_is_admin: bool, id: Uuid) -> AppResult<Diary> {
        let diary = self.diaries.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        if !diary.can_view(viewer_id, viewer_is_admin) {
            return Err(AppError::NotFound);
        }
        Ok(diary)
    }

    async fn update(&self, author_id: Uuid, id: Uuid, patch: UpdateDiary) -> AppResult<Diary> {
        if patch.is_empty() {
            return Err(AppError::validation("Nothing to update"));
        }
        patch.validate(self.max_entry_length().await?)?;
        self.owned(author_id, id).await?;
        self.diaries.update(id, patch).await
    }

    async fn delete(&self, author_id: Uuid, id: Uuid) -> AppResult<()> {
        self.owned(author_id, id).await?;
        self.diaries.delete(id).await?;
        tracing::debug!(diary_id = %id, author_id = %author_id, "Diary entry deleted");
        Ok(())
    }

    async fn list_mine(
        &self,
        author_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<Paginated<Diary>> {
        self.diaries.list_by_author(author_id, params).await
    }

    async fn public_feed(&self, params: PaginationParams) -> AppResult<Paginated<Diary>> {
        self.diaries.list_public(params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockDiaryRepository, MockSiteConfigRepository};
    use chrono::Utc;
    use domain::{DiaryStatus, SiteConfig, Visibility};

    fn entry(author_id: Uuid, visibility: Visibility) -> Diary {
        let now = Utc::now();
        Diary {
            id: Uuid::new_v4(),
            author_id,
            title: "Entry".to_string(),
            content: "Body".to_string(),
            mood: None,
            weather: None,
            visibility,
            status: DiaryStatus::Published,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn site_config(max_entry_length: u32) -> MockSiteConfigRepository {
        let mut repo = MockSiteConfigRepository::new();
        repo.expect_get().returning(move || {
            Ok(SiteConfig {
                max_entry_length,
                ..Default::default()
            })
        });
        repo
    }

    #[tokio::test]
    async fn test_create_respects_configured_length() {
        let mut diaries = MockDiaryRepository::new();
        diaries.expect_create().never();

        let service = DiaryManager::new(Arc::new(diaries), Arc::new(site_config(5)));
        let result = service
            .create(
                Uuid::new_v4(),
                CreateDiary {
                    title: "Long day".to_string(),
                    content: "far more than five characters".to_string(),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_private_entry_of_someone_else_is_not_found() {
        let stored = entry(Uuid::new_v4(), Visibility::Private);
        let id = stored.id;
        let mut diaries = MockDiaryRepository::new();
        diaries
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));

        let service = DiaryManager::new(Arc::new(diaries), Arc::new(site_config(100)));
        let result = service.get(Uuid::new_v4(), false, id).await;
        assert!(matches!(result, Err(AppError::NotFound)));

        // admins can read it
        assert!(service.get(Uuid::new_v4(), true, id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_public_entry_of_someone_else_is_forbidden() {
        let stored = entry(Uuid::new_v4(), Visibility::Public);
        let id = stored.id;
        let mut diaries = MockDiaryRepository::new();
        diaries
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        diaries.expect_update().never();

        let service = DiaryManager::new(Arc::new(diaries), Arc::new(site_config(100)));
        let patch = UpdateDiary {
            title: Some("Mine now".to_string()),
            ..Default::default()
        };
        let result = service.update(Uuid::new_v4(), id, patch).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_author_deletes_own_entry() {
        let author = Uuid::new_v4();
        let stored = entry(author, Visibility::Private);
        let id = stored.id;
        let mut diaries = MockDiaryRepository::new();
        diaries
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        diaries
            .expect_delete()
            .withf(move |deleted| *deleted == id)
            .times(1)
            .returning(|_| Ok(()));

        let service = DiaryManager::new(Arc::new(diaries), Arc::new(site_config(100)));
        service.delete(author, id).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let service = DiaryManager::new(
            Arc::new(MockDiaryRepository::new()),
            Arc::new(site_config(100)),
        );
        let result = service
            .update(Uuid::new_v4(), Uuid::new_v4(), UpdateDiary::default())
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
