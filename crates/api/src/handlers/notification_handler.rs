//! Notification handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use common::AppResult;
use domain::pagination::NotificationPage;
use domain::{
    NotificationResponse, Paginated, PaginationParams, UnreadCount, DEFAULT_PAGE_NUMBER,
    DEFAULT_PAGE_SIZE,
};

use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Query of the notification list
#[derive(Debug, Deserialize, IntoParams)]
pub struct NotificationQuery {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
    /// Items per page (capped at 100)
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    /// Only return unread notifications
    #[serde(default)]
    pub unread_only: bool,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_per_page() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Create notification routes
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/:id/read", post(mark_read))
}

/// List the signed-in user's notifications
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications, newest first", body = NotificationPage),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_notifications(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Paginated<NotificationResponse>>> {
    let params = PaginationParams::new(query.page, query.per_page);
    let page = state
        .notifications
        .list(current_user.id, query.unread_only, params)
        .await?;
    Ok(Json(page.map(NotificationResponse::from)))
}

/// Count unread notifications
#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unread count", body = UnreadCount),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn unread_count(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<UnreadCount>> {
    let unread = state.notifications.unread_count(current_user.id).await?;
    Ok(Json(UnreadCount { unread }))
}

/// Mark one notification as read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked as read", body = NotificationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found")
    )
)]
pub async fn mark_read(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<NotificationResponse>> {
    let notification = state.notifications.mark_read(current_user.id, id).await?;
    Ok(Json(NotificationResponse::from(notification)))
}

/// Mark every notification as read; returns how many are left unread (zero)
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All notifications read", body = UnreadCount),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn mark_all_read(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<UnreadCount>> {
    let marked = state.notifications.mark_all_read(current_user.id).await?;
    tracing::debug!(user_id = %current_user.id, marked, "Marked notifications read");
    let unread = state.notifications.unread_count(current_user.id).await?;
    Ok(Json(UnreadCount { unread }))
}
