//! HTTP handlers.

pub mod admin_handler;
pub mod auth_handler;
pub mod config_handler;
pub mod diary_handler;
pub mod health_handler;
pub mod notification_handler;

pub use admin_handler::admin_routes;
pub use auth_handler::{auth_routes, session_routes};
pub use config_handler::{config_admin_routes, config_routes};
pub use diary_handler::diary_routes;
pub use health_handler::health_routes;
pub use notification_handler::notification_routes;
