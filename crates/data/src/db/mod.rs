//! `PostgreSQL` document store.
//!
//! # Schema: `candela`
//!
//! ## Tables
//!
//! - `category` - Top-level catalog groups
//! - `subcategory` - Groups within a category (denormalized `category_name`)
//! - `product` - Products (denormalized `category_name` / `subcategory_name`)
//! - `settings` - Singleton JSONB documents (`general` = store settings)
//! - `user` / `user_password` - Accounts and password hashes
//! - `sessions` - tower-sessions storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/data/migrations/` and run via:
//! ```bash
//! cargo run -p candela-cli -- migrate
//! ```
//!
//! # Writes
//!
//! Every write runs in a transaction that also emits a change notice on the
//! [`CHANGE_CHANNEL`] channel, so listeners only hear about committed data.
//! Queries are built at runtime (`sqlx::query_as`) and decoded into row
//! structs, so the crate builds without a live database.

pub mod cascade;
pub mod categories;
pub mod products;
pub mod settings;
pub mod subcategories;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cascade::CascadeRepository;
pub use categories::CategoryRepository;
pub use products::ProductRepository;
pub use settings::SettingsRepository;
pub use subcategories::SubcategoryRepository;
pub use users::{User, UserRepository};

use crate::live::Collection;

/// `LISTEN`/`NOTIFY` channel carrying the name of the changed collection.
pub const CHANGE_CHANNEL: &str = "candela_changes";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique name).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to [`RepositoryError::Conflict`], anything else to `Database`.
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Queue a change notice for `collection`.
///
/// Inside a transaction the notice is delivered on commit and dropped on
/// rollback.
pub(crate) async fn notify<'e, E>(executor: E, collection: Collection) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("SELECT pg_notify($1, $2)")
        .bind(CHANGE_CHANNEL)
        .bind(collection.as_str())
        .execute(executor)
        .await?;
    Ok(())
}
