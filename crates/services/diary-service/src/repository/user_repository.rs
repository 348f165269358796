//! User repository implementation with soft delete (disable) support.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Order, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{Paginated, PaginationParams, User, UserRole, ROLE_ADMIN, ROLE_USER};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Disabled accounts are soft-deleted rows. By default, all query methods
/// exclude them; use `*_with_deleted` variants to include them.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find active user by ID (excludes disabled)
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by ID including disabled
    async fn find_by_id_with_deleted(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find active user by email address (excludes disabled)
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find user by email including disabled
    async fn find_by_email_with_deleted(&self, email: &str) -> AppResult<Option<User>>;

    /// Create a new user with the default role
    async fn create(&self, email: String, password_hash: String, name: String) -> AppResult<User>;

    /// Update user fields (only active users)
    async fn update(&self, id: Uuid, name: Option<String>, role: Option<UserRole>)
        -> AppResult<User>;

    /// Disable user by ID (sets deleted_at timestamp)
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Re-enable a disabled user
    async fn restore(&self, id: Uuid) -> AppResult<User>;

    /// List users, oldest first
    async fn list(&self, params: PaginationParams, include_disabled: bool)
        -> AppResult<Paginated<User>>;

    /// Count active admins
    async fn count_admins(&self) -> AppResult<u64>;

    /// Make `id` an admin if it is the oldest active account and no active
    /// admin exists yet. Returns the promoted user, or `None` when the
    /// conditions did not hold.
    async fn promote_first_admin(&self, id: Uuid) -> AppResult<Option<User>>;
}

/// Concrete implementation of UserRepository with soft delete
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_active_model(&self, id: Uuid) -> AppResult<user::Model> {
        UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}

/// Map unique-constraint violations on insert to a conflict.
fn map_insert_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict("User"),
        _ => AppError::from(err),
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn find_by_id_with_deleted(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id).one(&self.db).await?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn find_by_email_with_deleted(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn create(&self, email: String, password_hash: String, name: String) -> AppResult<User> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(password_hash),
            name: Set(name),
            role: Set(ROLE_USER.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let model = active_model.insert(&self.db).await.map_err(map_insert_error)?;
        Ok(User::from(model))
    }

    async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        role: Option<UserRole>,
    ) -> AppResult<User> {
        let user = self.find_active_model(id).await?;
        let mut active: ActiveModel = user.into();

        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(role) = role {
            active.role = Set(role.to_string());
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await?;
        Ok(User::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let user = self.find_active_model(id).await?;

        let mut active: ActiveModel = user.into();
        let now = chrono::Utc::now();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);

        active.update(&self.db).await?;
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> AppResult<User> {
        let user = UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_not_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::validation("User is not disabled or does not exist"))?;

        let mut active: ActiveModel = user.into();
        active.deleted_at = Set(None);
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await?;
        Ok(User::from(model))
    }

    async fn list(
        &self,
        params: PaginationParams,
        include_disabled: bool,
    ) -> AppResult<Paginated<User>> {
        let mut query = UserEntity::find();
        if !include_disabled {
            query = query.filter(user::Column::DeletedAt.is_null());
        }

        let paginator = query
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page_index()).await?;

        Ok(Paginated::new(
            models.into_iter().map(User::from).collect(),
            params,
            total,
        ))
    }

    async fn count_admins(&self) -> AppResult<u64> {
        let count = UserEntity::find()
            .filter(user::Column::Role.eq(ROLE_ADMIN))
            .filter(user::Column::DeletedAt.is_null())
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn promote_first_admin(&self, id: Uuid) -> AppResult<Option<User>> {
        let admin_exists = Query::select()
            .expr(Expr::val(1))
            .from(UserEntity)
            .and_where(user::Column::Role.eq(ROLE_ADMIN))
            .and_where(user::Column::DeletedAt.is_null())
            .to_owned();
        let oldest = Query::select()
            .column(user::Column::Id)
            .from(UserEntity)
            .and_where(user::Column::DeletedAt.is_null())
            .order_by(user::Column::CreatedAt, Order::Asc)
            .order_by(user::Column::Id, Order::Asc)
            .limit(1)
            .to_owned();

        // One statement, so concurrent registrations cannot both pass the checks
        let result = UserEntity::update_many()
            .col_expr(user::Column::Role, Expr::value(ROLE_ADMIN))
            .col_expr(user::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::Id.in_subquery(oldest))
            .filter(Expr::exists(admin_exists).not())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}
