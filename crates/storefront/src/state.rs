//! Application state shared across handlers.

use std::sync::Arc;

use chrono::TimeDelta;
use sqlx::PgPool;

use candela_data::LiveCatalog;

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: LiveCatalog,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool, catalog: LiveCatalog) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
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

    #[must_use]
    pub fn inactivity_timeout(&self) -> TimeDelta {
        self.inner.config.inactivity_timeout
    }
}
