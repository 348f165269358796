//! Notification repository.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::notification::{self, ActiveModel, Entity as NotificationEntity};
use common::{AppError, AppResult};
use domain::{Notification, NotificationKind, Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: String,
        body: String,
    ) -> AppResult<Notification>;

    /// Newest first
    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        params: PaginationParams,
    ) -> AppResult<Paginated<Notification>>;

    async fn unread_count(&self, user_id: Uuid) -> AppResult<u64>;

    /// Mark one notification read. Notifications of other users are not found.
    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> AppResult<Notification>;

    /// Mark every unread notification read, returning how many changed
    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64>;
}

pub struct NotificationStore {
    db: DatabaseConnection,
}

impl NotificationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for NotificationStore {
    async fn create(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: String,
        body: String,
    ) -> AppResult<Notification> {
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            kind: Set(kind.as_str().to_string()),
            title: Set(title),
            body: Set(body),
            read_at: Set(None),
            created_at: Set(chrono::Utc::now()),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Notification::from(model))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        params: PaginationParams,
    ) -> AppResult<Paginated<Notification>> {
        let mut query = NotificationEntity::find().filter(notification::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notification::Column::ReadAt.is_null());
        }

        let paginator = query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page_index()).await?;

        Ok(Paginated::new(
            models.into_iter().map(Notification::from).collect(),
            params,
            total,
        ))
    }

    async fn unread_count(&self, user_id: Uuid) -> AppResult<u64> {
        let count = NotificationEntity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::ReadAt.is_null())
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> AppResult<Notification> {
        let model = NotificationEntity::find_by_id(id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        // Already read: keep the original timestamp
        if model.read_at.is_some() {
            return Ok(Notification::from(model));
        }

        let mut active: ActiveModel = model.into();
        active.read_at = Set(Some(chrono::Utc::now()));
        let model = active.update(&self.db).await?;
        Ok(Notification::from(model))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = NotificationEntity::update_many()
            .col_expr(
                notification::Column::ReadAt,
                Expr::value(Some(chrono::Utc::now())),
            )
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::ReadAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
