//! Route configuration.

use axum::{middleware, Router};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{
    admin_routes, auth_routes, config_admin_routes, config_routes, diary_routes, health_routes,
    notification_routes, session_routes,
};
use crate::middleware::{
    admin_middleware, auth_middleware, rate_limit_auth_middleware, rate_limit_middleware,
};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the main router with all routes.
///
/// Route layers run outermost-last, so every group is rate limited before
/// its token is checked.
pub fn create_router(state: AppState) -> Router {
    // Credential routes (no auth required, stricter rate limit)
    let public_auth = auth_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        rate_limit_auth_middleware,
    ));

    // Public reads (no auth required, general rate limit)
    let public = config_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        rate_limit_middleware,
    ));

    // Signed-in routes (auth required, general rate limit)
    let protected = Router::new()
        .merge(session_routes())
        .merge(diary_routes())
        .merge(notification_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Admin routes (admin role required)
    let admin = Router::new()
        .merge(admin_routes())
        .merge(config_admin_routes())
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        // Health check (no auth, no rate limit)
        .merge(health_routes())
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_auth)
        .merge(public)
        .merge(protected)
        .merge(admin)
        .with_state(state)
}
