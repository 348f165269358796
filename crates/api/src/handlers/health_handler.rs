//! Health check handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub services: ServiceStatus,
}

/// Individual dependency status.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub database: ServiceHealth,
    pub cache: ServiceHealth,
}

/// Service health with optional error message.
#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    fn from_result<E: ToString>(result: Result<(), E>, backend: Option<&str>) -> Self {
        let backend = backend.map(str::to_string);
        match result {
            Ok(()) => Self {
                status: "healthy".to_string(),
                backend,
                error: None,
            },
            Err(e) => Self {
                status: "unhealthy".to_string(),
                backend,
                error: Some(e.to_string()),
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Create health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check endpoint - verifies database and cache connectivity.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let database = ServiceHealth::from_result(state.database.ping().await, None);
    let cache = ServiceHealth::from_result(
        state.cache.ping().await,
        Some(state.cache.backend_name()),
    );

    let all_healthy = database.is_healthy() && cache.is_healthy();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        services: ServiceStatus { database, cache },
    };

    if all_healthy {
        (StatusCode::OK, Json(response)).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response)).into_response()
    }
}
