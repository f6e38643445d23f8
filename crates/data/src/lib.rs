//! Candela Data - Persistence and external services.
//!
//! Everything that talks to the outside world lives here so both web binaries
//! share one implementation:
//!
//! - [`db`] - `PostgreSQL` document store (catalog collections, settings, users)
//! - [`live`] - Standing subscriptions that keep in-memory snapshots current
//! - [`catalog`] - The catalog subscriptions both web processes keep open
//! - [`storage`] - Object storage for product images and the store logo
//! - [`identity`] - Password sign-up and sign-in
//!
//! # Change notifications
//!
//! Every write runs `pg_notify('candela_changes', '<collection>')` inside its
//! transaction. [`live::ChangeFeed`] listens on that channel and fans the
//! notices out to subscriptions, which refetch the whole collection.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod db;
pub mod identity;
pub mod live;
pub mod storage;

pub use catalog::LiveCatalog;
pub use db::{RepositoryError, create_pool};
pub use live::{ChangeFeed, Collection, LiveCollection, Snapshot};

/// Embedded schema migrations for the `candela` schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
