//! The four catalog subscriptions every web process keeps open.

use std::sync::Arc;

use futures::FutureExt;
use sqlx::PgPool;

use candela_core::catalog::{Category, Product, StoreSettings, Subcategory};

use crate::db::{
    CategoryRepository, ProductRepository, RepositoryError, SettingsRepository,
    SubcategoryRepository,
};
use crate::live::{self, ChangeFeed, Collection, FetchFn, Live, LiveCollection};

/// Live snapshots of products, categories, subcategories and store settings.
#[derive(Clone)]
pub struct LiveCatalog {
    pub products: LiveCollection<Product>,
    pub categories: LiveCollection<Category>,
    pub subcategories: LiveCollection<Subcategory>,
    /// Missing or unreadable settings resolve to [`StoreSettings::default`].
    pub settings: Live<StoreSettings>,
}

impl LiveCatalog {
    /// Subscribe to every catalog collection in `pool`'s database.
    #[must_use]
    pub fn start(pool: &PgPool, feed: &ChangeFeed) -> Self {
        Self {
            products: live::subscribe(
                Collection::Products,
                feed,
                fetcher(pool, |pool| async move { ProductRepository::new(&pool).list().await }),
            ),
            categories: live::subscribe(
                Collection::Categories,
                feed,
                fetcher(pool, |pool| async move { CategoryRepository::new(&pool).list().await }),
            ),
            subcategories: live::subscribe(
                Collection::Subcategories,
                feed,
                fetcher(pool, |pool| async move {
                    SubcategoryRepository::new(&pool).list().await
                }),
            ),
            settings: live::subscribe(
                Collection::Settings,
                feed,
                fetcher(pool, |pool| async move {
                    Ok(SettingsRepository::new(&pool).get().await?.unwrap_or_default())
                }),
            ),
        }
    }

    /// Refetch one collection now. See [`Live::refresh`].
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the previous snapshot is kept.
    pub async fn refresh(&self, collection: Collection) -> Result<(), RepositoryError> {
        match collection {
            Collection::Products => self.products.refresh().await,
            Collection::Categories => self.categories.refresh().await,
            Collection::Subcategories => self.subcategories.refresh().await,
            Collection::Settings => self.settings.refresh().await,
        }
    }

    /// Whether any catalog collection is still waiting for its first snapshot.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.products.snapshot().loading
            || self.categories.snapshot().loading
            || self.subcategories.snapshot().loading
    }

    /// Active categories in creation order.
    #[must_use]
    pub fn active_categories(&self) -> Vec<Category> {
        self.categories
            .data()
            .iter()
            .filter(|c| c.active)
            .cloned()
            .collect()
    }

    /// Active subcategories in creation order.
    #[must_use]
    pub fn active_subcategories(&self) -> Vec<Subcategory> {
        self.subcategories
            .data()
            .iter()
            .filter(|s| s.active)
            .cloned()
            .collect()
    }
}

fn fetcher<V, F, Fut>(pool: &PgPool, query: F) -> FetchFn<V>
where
    F: Fn(PgPool) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, RepositoryError>> + Send + 'static,
    V: 'static,
{
    let pool = pool.clone();
    Arc::new(move || query(pool.clone()).boxed())
}
