//! Catalog domain: entities and the derived state computed from them.
//!
//! Every function in this module works on in-memory snapshots (slices of
//! products, categories and subcategories) and is recomputed from scratch
//! whenever a snapshot changes. Nothing here performs I/O.

pub mod aggregate;
pub mod cascade;
pub mod filter;
pub mod model;
pub mod validate;

pub use aggregate::{CategoryGroup, DashboardCounters, StockBreakdown, SubcategoryGroup};
pub use cascade::{CascadePlan, DependencyReport, RenamePlan};
pub use filter::CatalogFilter;
pub use model::{Category, Product, SocialLinks, StoreSettings, Subcategory};
pub use validate::{
    CategoryInput, CurrentParents, ProductDraft, ProductInput, SettingsInput, SubcategoryInput, ValidationError,
};
