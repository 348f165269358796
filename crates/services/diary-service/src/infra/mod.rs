//! Infrastructure layer - database connection and schema migrations.

mod db;
pub mod migrations;

pub use db::Database;
pub use migrations::Migrator;

/// Migration action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}
