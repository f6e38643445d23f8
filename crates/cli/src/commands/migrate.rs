//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! candela-cli migrate
//! ```
//!
//! Runs the embedded `candela` schema migrations, then creates the session
//! table both web binaries share.

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Session table error: {0}")]
    Sessions(#[from] sqlx::Error),
}

/// Run all migrations.
///
/// # Errors
///
/// Returns `MigrationError` if a migration fails to apply.
pub async fn run(pool: &PgPool) -> Result<(), MigrationError> {
    tracing::info!("Running catalog migrations...");
    candela_data::MIGRATOR.run(pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
