//! # Registry Infrastructure
//!
//! PostgreSQL adapter for the user registry (connection pool, repository
//! implementation, migrations).

pub mod database;

pub use database::{create_pool, run_migrations, PgUserRepository};
