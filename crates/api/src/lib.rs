//! HTTP API for the diary service.
//!
//! Wires the persistence and auth crates into an Axum router with JWT
//! authentication, rate limiting and an OpenAPI document.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use diary_service_lib::infra::Database;

pub use crate::config::AppConfig;
use crate::middleware::Cache;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the application router for an already connected database.
pub fn app(database: Database, cache: Arc<Cache>, config: AppConfig) -> axum::Router {
    let state = AppState::new(database, cache, config);
    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the HTTP server until Ctrl-C or SIGTERM.
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let database = Database::connect_with(&config.database).await?;
    let cache = Arc::new(Cache::from_config(&config.cache).await);
    info!(cache = cache.backend_name(), "Cache ready");

    let addr: SocketAddr = config.server_addr().parse()?;
    let app = app(database, cache, config);

    info!("API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
