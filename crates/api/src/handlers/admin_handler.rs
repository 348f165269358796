//! Admin moderation handlers.
//!
//! Every route here sits behind both the auth and the admin middleware.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::pagination::{DiaryPage, UserPage};
use domain::{
    is_valid_role, DiaryResponse, DiaryStatus, Paginated, PaginationParams, UserResponse,
    UserRole, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE,
};

use crate::extractors::ValidatedJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Query of the user list
#[derive(Debug, Deserialize, IntoParams)]
pub struct UserListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    /// Include disabled accounts
    #[serde(default)]
    pub include_disabled: bool,
}

/// Query of the moderation list
#[derive(Debug, Deserialize, IntoParams)]
pub struct DiaryListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    /// Only entries in this moderation state
    #[param(value_type = Option<String>, example = "hidden")]
    pub status: Option<DiaryStatus>,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_per_page() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Role change request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeRoleRequest {
    #[validate(custom(function = "validate_role"))]
    #[schema(example = "admin")]
    pub role: String,
}

fn validate_role(role: &str) -> Result<(), validator::ValidationError> {
    if is_valid_role(role) {
        Ok(())
    } else {
        let mut error = validator::ValidationError::new("role");
        error.message = Some("Role must be 'user' or 'admin'".into());
        Err(error)
    }
}

/// Reason shown to the author of a hidden entry
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct HideDiaryRequest {
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    #[schema(example = "Contains personal data of others")]
    pub reason: Option<String>,
}

/// Create admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id/role", put(change_role))
        .route("/admin/users/:id/disable", post(disable_user))
        .route("/admin/users/:id/restore", post(restore_user))
        .route("/admin/diaries", get(list_diaries))
        .route("/admin/diaries/:id/hide", post(hide_diary))
        .route("/admin/diaries/:id/restore", post(restore_diary))
}

/// List users
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(UserListQuery),
    responses(
        (status = 200, description = "Users, oldest first", body = UserPage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let params = PaginationParams::new(query.page, query.per_page);
    let page = state
        .users
        .list_users(params, query.include_disabled)
        .await?;
    Ok(Json(page.map(UserResponse::from)))
}

/// Change a user's role
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = UserResponse),
        (status = 400, description = "Invalid role or last admin"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn change_role(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ChangeRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    let role = UserRole::from(payload.role.as_str());
    let user = state.users.change_role(current_user.id, id, role).await?;
    tracing::info!(admin = %current_user.id, user_id = %id, role = %role, "Role changed");
    Ok(Json(UserResponse::from(user)))
}

/// Disable a user account
#[utoipa::path(
    post,
    path = "/admin/users/{id}/disable",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User disabled"),
        (status = 400, description = "Cannot disable yourself"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn disable_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.users.disable(current_user.id, id).await?;
    tracing::info!(admin = %current_user.id, user_id = %id, "User disabled");
    Ok(StatusCode::NO_CONTENT)
}

/// Re-enable a disabled account
#[utoipa::path(
    post,
    path = "/admin/users/{id}/restore",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User restored", body = UserResponse),
        (status = 400, description = "User is not disabled"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn restore_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state.users.restore(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// List entries across authors
#[utoipa::path(
    get,
    path = "/admin/diaries",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(DiaryListQuery),
    responses(
        (status = 200, description = "Entries, newest first", body = DiaryPage),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_diaries(
    State(state): State<AppState>,
    Query(query): Query<DiaryListQuery>,
) -> AppResult<Json<Paginated<DiaryResponse>>> {
    let params = PaginationParams::new(query.page, query.per_page);
    let page = state.moderation.list_diaries(query.status, params).await?;
    Ok(Json(page.map(DiaryResponse::from)))
}

/// Hide an entry and notify its author
#[utoipa::path(
    post,
    path = "/admin/diaries/{id}/hide",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Entry ID")
    ),
    request_body = HideDiaryRequest,
    responses(
        (status = 200, description = "Entry hidden", body = DiaryResponse),
        (status = 400, description = "Entry is already hidden"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn hide_diary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<HideDiaryRequest>,
) -> AppResult<Json<DiaryResponse>> {
    let reason = payload.reason.filter(|r| !r.trim().is_empty());
    let diary = state.moderation.hide_diary(id, reason).await?;
    Ok(Json(DiaryResponse::from(diary)))
}

/// Publish a hidden entry again
#[utoipa::path(
    post,
    path = "/admin/diaries/{id}/restore",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Entry ID")
    ),
    responses(
        (status = 200, description = "Entry restored", body = DiaryResponse),
        (status = 400, description = "Entry is not hidden"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn restore_diary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DiaryResponse>> {
    let diary = state.moderation.restore_diary(id).await?;
    Ok(Json(DiaryResponse::from(diary)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_validation() {
        let ok = ChangeRoleRequest {
            role: "admin".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = ChangeRoleRequest {
            role: "root".to_string(),
        };
        assert!(bad.validate().is_err());
    }
}
