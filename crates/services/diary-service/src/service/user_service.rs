//! User service - profile lookups and admin account management.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{Paginated, PaginationParams, User, UserRole};

use crate::repository::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get an active user's profile
    async fn get_profile(&self, id: Uuid) -> AppResult<User>;

    /// List users for the admin console
    async fn list_users(
        &self,
        params: PaginationParams,
        include_disabled: bool,
    ) -> AppResult<Paginated<User>>;

    /// Change another user's role
    async fn change_role(&self, actor_id: Uuid, id: Uuid, role: UserRole) -> AppResult<User>;

    /// Disable (ban) another user
    async fn disable(&self, actor_id: Uuid, id: Uuid) -> AppResult<()>;

    /// Re-enable a disabled user
    async fn restore(&self, id: Uuid) -> AppResult<User>;
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
}

impl UserManager {
    /// Create new user service instance with repository
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn get_profile(&self, id: Uuid) -> AppResult<User> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn list_users(
        &self,
        params: PaginationParams,
        include_disabled: bool,
    ) -> AppResult<Paginated<User>> {
        self.repo.list(params, include_disabled).await
    }

    async fn change_role(&self, actor_id: Uuid, id: Uuid, role: UserRole) -> AppResult<User> {
        if actor_id == id && !role.is_admin() {
            return Err(AppError::validation("You cannot remove your own admin role"));
        }

        let target = self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)?;
        if target.role == role {
            return Ok(target);
        }
        if target.is_admin() && self.repo.count_admins().await? <= 1 {
            return Err(AppError::validation("At least one admin must remain"));
        }

        let user = self.repo.update(id, None, Some(role)).await?;
        tracing::info!(user_id = %id, role = %role, actor = %actor_id, "User role changed");
        Ok(user)
    }

    async fn disable(&self, actor_id: Uuid, id: Uuid) -> AppResult<()> {
        if actor_id == id {
            return Err(AppError::validation("You cannot disable your own account"));
        }
        self.repo.delete(id).await?;
        tracing::info!(user_id = %id, actor = %actor_id, "User disabled");
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> AppResult<User> {
        let user = self.repo.restore(id).await?;
        tracing::info!(user_id = %id, "User restored");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;

    fn user(role: UserRole) -> User {
        let mut user = User::new(
            Uuid::new_v4(),
            "someone@example.com".to_string(),
            "hash".to_string(),
            "Someone".to_string(),
        );
        user.role = role;
        user
    }

    #[tokio::test]
    async fn test_cannot_demote_self() {
        let service = UserManager::new(Arc::new(MockUserRepository::new()));
        let id = Uuid::new_v4();
        let result = service.change_role(id, id, UserRole::User).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_last_admin_is_kept() {
        let admin = user(UserRole::Admin);
        let returned = admin.clone();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(returned.clone())));
        repo.expect_count_admins().returning(|| Ok(1));
        repo.expect_update().never();

        let service = UserManager::new(Arc::new(repo));
        let result = service
            .change_role(Uuid::new_v4(), admin.id, UserRole::User)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_promote_user() {
        let target = user(UserRole::User);
        let target_id = target.id;
        let mut promoted = target.clone();
        promoted.role = UserRole::Admin;

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(target.clone())));
        repo.expect_update()
            .withf(move |id, name, role| {
                *id == target_id && name.is_none() && *role == Some(UserRole::Admin)
            })
            .returning(move |_, _, _| Ok(promoted.clone()));

        let service = UserManager::new(Arc::new(repo));
        let user = service
            .change_role(Uuid::new_v4(), target_id, UserRole::Admin)
            .await
            .unwrap();
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_cannot_disable_self() {
        let mut repo = MockUserRepository::new();
        repo.expect_delete().never();
        let service = UserManager::new(Arc::new(repo));
        let id = Uuid::new_v4();
        assert!(service.disable(id, id).await.is_err());
    }
}
