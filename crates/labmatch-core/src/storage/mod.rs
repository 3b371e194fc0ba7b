//! Storage layer: SQLite pool management and schema migrations

pub mod database;
pub mod migrations;

pub use database::{Database, DatabaseConfig};
pub use migrations::{migration_status, needs_migration, run_migrations, MigrationStatus};
