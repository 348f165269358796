//! Diary entry handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

use common::AppResult;
use domain::pagination::DiaryPage;
use domain::{CreateDiary, DiaryResponse, Paginated, PaginationParams, UpdateDiary};

use crate::extractors::JsonBody;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Create diary routes
pub fn diary_routes() -> Router<AppState> {
    Router::new()
        .route("/diaries", get(list_my_diaries).post(create_diary))
        .route("/diaries/public", get(public_diaries))
        .route(
            "/diaries/:id",
            get(get_diary).put(update_diary).delete(delete_diary),
        )
}

/// List the signed-in user's entries
#[utoipa::path(
    get,
    path = "/diaries",
    tag = "Diaries",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "Own entries, newest first", body = DiaryPage),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_my_diaries(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<DiaryResponse>>> {
    let page = state.diaries.list_mine(current_user.id, params).await?;
    Ok(Json(page.map(DiaryResponse::from)))
}

/// Public feed of every author's published entries
#[utoipa::path(
    get,
    path = "/diaries/public",
    tag = "Diaries",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "Public entries, newest first", body = DiaryPage),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn public_diaries(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<DiaryResponse>>> {
    let page = state.diaries.public_feed(params).await?;
    Ok(Json(page.map(DiaryResponse::from)))
}

/// Write a new entry
#[utoipa::path(
    post,
    path = "/diaries",
    tag = "Diaries",
    security(("bearer_auth" = [])),
    request_body = CreateDiary,
    responses(
        (status = 201, description = "Entry created", body = DiaryResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_diary(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateDiary>,
) -> AppResult<(StatusCode, Json<DiaryResponse>)> {
    let diary = state.diaries.create(current_user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(DiaryResponse::from(diary))))
}

/// Read one entry
#[utoipa::path(
    get,
    path = "/diaries/{id}",
    tag = "Diaries",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Entry ID")
    ),
    responses(
        (status = 200, description = "Entry", body = DiaryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Entry not found or not visible")
    )
)]
pub async fn get_diary(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DiaryResponse>> {
    let diary = state
        .diaries
        .get(current_user.id, current_user.is_admin(), id)
        .await?;
    Ok(Json(DiaryResponse::from(diary)))
}

/// Update one of the signed-in user's entries
#[utoipa::path(
    put,
    path = "/diaries/{id}",
    tag = "Diaries",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Entry ID")
    ),
    request_body = UpdateDiary,
    responses(
        (status = 200, description = "Entry updated", body = DiaryResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Entry belongs to someone else"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn update_diary(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateDiary>,
) -> AppResult<Json<DiaryResponse>> {
    let diary = state.diaries.update(current_user.id, id, payload).await?;
    Ok(Json(DiaryResponse::from(diary)))
}

/// Delete one of the signed-in user's entries
#[utoipa::path(
    delete,
    path = "/diaries/{id}",
    tag = "Diaries",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Entry ID")
    ),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Entry belongs to someone else"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn delete_diary(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.diaries.delete(current_user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
