//! Diary entry repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use uuid::Uuid;

use super::entities::diary::{self, ActiveModel, Entity as DiaryEntity};
use common::{AppError, AppResult};
use domain::{
    CreateDiary, Diary, DiaryStatus, Paginated, PaginationParams, UpdateDiary, Visibility,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Diary repository trait for dependency injection.
///
/// Lists return newest entries first and never include deleted ones.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DiaryRepository: Send + Sync {
    /// Insert a new published entry
    async fn create(&self, author_id: Uuid, input: CreateDiary) -> AppResult<Diary>;

    /// Find a non-deleted entry by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Diary>>;

    /// Find an entry by ID including deleted
    async fn find_by_id_with_deleted(&self, id: Uuid) -> AppResult<Option<Diary>>;

    /// Entries written by one author, in any state
    async fn list_by_author(
        &self,
        author_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<Paginated<Diary>>;

    /// Public, published entries of every author
    async fn list_public(&self, params: PaginationParams) -> AppResult<Paginated<Diary>>;

    /// All entries, optionally filtered by moderation status
    async fn list_all(
        &self,
        status: Option<DiaryStatus>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Diary>>;

    /// Apply a partial update
    async fn update(&self, id: Uuid, patch: UpdateDiary) -> AppResult<Diary>;

    /// Change the moderation status
    async fn set_status(&self, id: Uuid, status: DiaryStatus) -> AppResult<Diary>;

    /// Soft delete an entry
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// SeaORM implementation of DiaryRepository
pub struct DiaryStore {
    db: DatabaseConnection,
}

impl DiaryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_active_model(&self, id: Uuid) -> AppResult<diary::Model> {
        DiaryEntity::find_by_id(id)
            .filter(diary::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn paginate(
        &self,
        query: Select<DiaryEntity>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Diary>> {
        let paginator = query
            .filter(diary::Column::DeletedAt.is_null())
            .order_by_desc(diary::Column::CreatedAt)
            .order_by_desc(diary::Column::Id)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page_index()).await?;

        Ok(Paginated::new(
            models.into_iter().map(Diary::from).collect(),
            params,
            total,
        ))
    }
}

#[async_trait]
impl DiaryRepository for DiaryStore {
    async fn create(&self, author_id: Uuid, input: CreateDiary) -> AppResult<Diary> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            author_id: Set(author_id),
            title: Set(input.title.trim().to_string()),
            content: Set(input.content),
            mood: Set(input.mood),
            weather: Set(input.weather),
            visibility: Set(input.visibility.as_str().to_string()),
            status: Set(DiaryStatus::Published.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Diary::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Diary>> {
        let result = DiaryEntity::find_by_id(id)
            .filter(diary::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        Ok(result.map(Diary::from))
    }

    async fn find_by_id_with_deleted(&self, id: Uuid) -> AppResult<Option<Diary>> {
        let result = DiaryEntity::find_by_id(id).one(&self.db).await?;

        Ok(result.map(Diary::from))
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<Paginated<Diary>> {
        let query = DiaryEntity::find().filter(diary::Column::AuthorId.eq(author_id));
        self.paginate(query, params).await
    }

    async fn list_public(&self, params: PaginationParams) -> AppResult<Paginated<Diary>> {
        let query = DiaryEntity::find()
            .filter(diary::Column::Visibility.eq(Visibility::Public.as_str()))
            .filter(diary::Column::Status.eq(DiaryStatus::Published.as_str()));
        self.paginate(query, params).await
    }

    async fn list_all(
        &self,
        status: Option<DiaryStatus>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Diary>> {
        let mut query = DiaryEntity::find();
        if let Some(status) = status {
            query = query.filter(diary::Column::Status.eq(status.as_str()));
        }
        self.paginate(query, params).await
    }

    async fn update(&self, id: Uuid, patch: UpdateDiary) -> AppResult<Diary> {
        let model = self.find_active_model(id).await?;
        let mut active: ActiveModel = model.into();

        if let Some(title) = patch.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(content) = patch.content {
            active.content = Set(content);
        }
        // An empty label clears it
        if let Some(mood) = patch.mood {
            active.mood = Set(Some(mood).filter(|m| !m.is_empty()));
        }
        if let Some(weather) = patch.weather {
            active.weather = Set(Some(weather).filter(|w| !w.is_empty()));
        }
        if let Some(visibility) = patch.visibility {
            active.visibility = Set(visibility.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await?;
        Ok(Diary::from(model))
    }

    async fn set_status(&self, id: Uuid, status: DiaryStatus) -> AppResult<Diary> {
        let model = self.find_active_model(id).await?;
        let mut active: ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await?;
        Ok(Diary::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let model = self.find_active_model(id).await?;
        let mut active: ActiveModel = model.into();
        let now = chrono::Utc::now();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);

        active.update(&self.db).await?;
        Ok(())
    }
}
