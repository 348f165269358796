//! Diary Service Library
//!
//! Persistence and use cases for users, diary entries, notifications,
//! site configuration and moderation. The HTTP API and the combined
//! binary build on top of it.

pub mod infra;
pub mod repository;
pub mod service;

use tracing::info;

use crate::infra::Database;

pub use infra::MigrateAction;

/// Run a migration action against the given database (for CLI commands).
pub async fn run_migrations(database_url: &str, action: MigrateAction) -> common::AppResult<()> {
    let db = Database::connect_without_migrations(database_url).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}
