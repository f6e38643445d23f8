//! Application state shared across handlers.

use std::sync::Arc;

use chrono::TimeDelta;
use sqlx::PgPool;

use candela_data::LiveCatalog;
use candela_data::storage::LocalMediaStore;

use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    catalog: LiveCatalog,
    media: LocalMediaStore,
}

impl AppState {
    /// Create a new application state. Uploads go to the configured media directory.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool, catalog: LiveCatalog) -> Self {
        let media = LocalMediaStore::new(config.media.dir.clone(), &config.media.url);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                media,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Live catalog snapshots.
    #[must_use]
    pub fn catalog(&self) -> &LiveCatalog {
        &self.inner.catalog
    }

    /// Where uploaded images are stored.
    #[must_use]
    pub fn media(&self) -> &LocalMediaStore {
        &self.inner.media
    }

    #[must_use]
    pub fn inactivity_timeout(&self) -> TimeDelta {
        self.inner.config.inactivity_timeout
    }
}
