//! Catalog page: all visible products, filtered by category and subcategory.
//!
//! The selection lives in the query string so every filter state is a
//! shareable URL. Picking a category link drops any subcategory.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::instrument;

use candela_core::catalog::{CatalogFilter, Category, Subcategory};
use candela_core::{CategoryId, SubcategoryId};

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::Layout;
use crate::routes::products::ProductCardView;
use crate::state::AppState;

/// Catalog query parameters. Unparseable ids are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

/// A filter link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChip {
    pub label: String,
    pub href: String,
    pub selected: bool,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog.html")]
pub struct CatalogTemplate {
    pub layout: Layout,
    pub loading: bool,
    pub heading: String,
    pub category_chips: Vec<FilterChip>,
    pub subcategory_chips: Vec<FilterChip>,
    pub products: Vec<ProductCardView>,
    pub filtered: bool,
}

/// Display the catalog.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let catalog = state.catalog();
    let products = catalog.products.data();
    let categories = catalog.active_categories();
    let subcategories = catalog.active_subcategories();

    let filter = restore_filter(&query, &categories, &subcategories);
    let visible = filter.visible_products(&products, &categories, &subcategories);

    CatalogTemplate {
        layout: Layout::new(&state, user),
        loading: catalog.is_loading(),
        heading: heading(&filter, &categories, &subcategories),
        category_chips: category_chips(&filter, &categories),
        subcategory_chips: subcategory_chips(&filter, &subcategories),
        products: visible.into_iter().map(ProductCardView::from).collect(),
        filtered: filter.is_filtered(),
    }
}

/// Rebuild the filter from the query, dropping ids that are not active.
fn restore_filter(
    query: &CatalogQuery,
    categories: &[Category],
    subcategories: &[Subcategory],
) -> CatalogFilter {
    let category = query
        .category
        .as_deref()
        .and_then(|raw| CategoryId::parse_optional(raw).ok().flatten())
        .filter(|id| categories.iter().any(|c| c.id == *id));
    let subcategory = query
        .subcategory
        .as_deref()
        .and_then(|raw| SubcategoryId::parse_optional(raw).ok().flatten());

    CatalogFilter::restore(category, subcategory, subcategories)
}

fn catalog_href(category: Option<CategoryId>, subcategory: Option<SubcategoryId>) -> String {
    match (category, subcategory) {
        (Some(c), Some(s)) => format!("/catalog?category={c}&subcategory={s}"),
        (Some(c), None) => format!("/catalog?category={c}"),
        (None, _) => "/catalog".to_string(),
    }
}

/// "Todos" followed by one chip per active category.
fn category_chips(filter: &CatalogFilter, categories: &[Category]) -> Vec<FilterChip> {
    std::iter::once(FilterChip {
        label: "Todos".to_string(),
        href: catalog_href(None, None),
        selected: filter.selected_category.is_none(),
    })
    .chain(categories.iter().map(|c| FilterChip {
        label: c.name.clone(),
        href: catalog_href(Some(c.id), None),
        selected: filter.selected_category == Some(c.id),
    }))
    .collect()
}

/// Subcategory chips of the selected category, empty when it has none.
fn subcategory_chips(filter: &CatalogFilter, subcategories: &[Subcategory]) -> Vec<FilterChip> {
    let chips = filter.subcategory_chips(subcategories);
    if chips.is_empty() {
        return Vec::new();
    }
    std::iter::once(FilterChip {
        label: "Todas".to_string(),
        href: catalog_href(filter.selected_category, None),
        selected: filter.selected_subcategory.is_none(),
    })
    .chain(chips.into_iter().map(|s| FilterChip {
        label: s.name.clone(),
        href: catalog_href(Some(s.category_id), Some(s.id)),
        selected: filter.selected_subcategory == Some(s.id),
    }))
    .collect()
}

fn heading(filter: &CatalogFilter, categories: &[Category], subcategories: &[Subcategory]) -> String {
    let subcategory = filter
        .selected_subcategory
        .and_then(|id| subcategories.iter().find(|s| s.id == id));
    let category = filter
        .selected_category
        .and_then(|id| categories.iter().find(|c| c.id == id));

    match (category, subcategory) {
        (Some(c), Some(s)) => format!("{} · {}", c.name, s.name),
        (Some(c), None) => c.name.clone(),
        _ => "Todos los productos".to_string(),
    }
}
