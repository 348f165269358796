//! Site configuration handlers.

use axum::{extract::State, response::Json, routing::get, Router};

use common::AppResult;
use domain::{SiteConfig, UpdateSiteConfig};

use crate::extractors::JsonBody;
use crate::state::AppState;

/// Public read-only configuration
pub fn config_routes() -> Router<AppState> {
    Router::new().route("/config", get(get_config))
}

/// Configuration updates (admin only)
pub fn config_admin_routes() -> Router<AppState> {
    Router::new().route("/config", axum::routing::put(update_config))
}

/// Get the site configuration
#[utoipa::path(
    get,
    path = "/config",
    tag = "Config",
    responses(
        (status = 200, description = "Site configuration", body = SiteConfig)
    )
)]
pub async fn get_config(State(state): State<AppState>) -> AppResult<Json<SiteConfig>> {
    Ok(Json(state.site_config.get().await?))
}

/// Update the site configuration
#[utoipa::path(
    put,
    path = "/config",
    tag = "Config",
    security(("bearer_auth" = [])),
    request_body = UpdateSiteConfig,
    responses(
        (status = 200, description = "Updated configuration", body = SiteConfig),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn update_config(
    State(state): State<AppState>,
    JsonBody(patch): JsonBody<UpdateSiteConfig>,
) -> AppResult<Json<SiteConfig>> {
    Ok(Json(state.site_config.update(patch).await?))
}
