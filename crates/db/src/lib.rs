//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//!
//! All multi-step write paths (document creation, stock transfers, sequence
//! advancement) run inside a single database transaction and take explicit
//! row locks on the sequence and stock rows they mutate.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    DocumentRepository, ProductRepository, SequenceRepository, StockRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
