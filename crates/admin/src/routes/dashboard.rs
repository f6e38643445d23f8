//! Dashboard route handler.
//!
//! Headline counters and the stock breakdown, both computed from the live
//! snapshots on every request.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use candela_core::catalog::{
    CategoryGroup, DashboardCounters, Product, StockBreakdown, SubcategoryGroup,
};

use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::Layout;
use crate::state::AppState;

/// A product line in the breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLineView {
    pub name: String,
    pub stock: i32,
    pub out_of_stock: bool,
}

impl From<&Product> for StockLineView {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            stock: product.stock,
            out_of_stock: product.is_out_of_stock(),
        }
    }
}

/// A subcategory inside a category of the breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcategoryStockView {
    pub name: String,
    pub stock: i64,
    pub products: Vec<StockLineView>,
}

impl From<&SubcategoryGroup<'_>> for SubcategoryStockView {
    fn from(group: &SubcategoryGroup<'_>) -> Self {
        Self {
            name: group.name.clone(),
            stock: group.stock,
            products: group.products.iter().map(|p| StockLineView::from(*p)).collect(),
        }
    }
}

/// A category of the breakdown. Categories without subcategorized products
/// list their products directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStockView {
    pub name: String,
    pub stock: i64,
    pub product_count: usize,
    pub subcategories: Vec<SubcategoryStockView>,
    pub products: Vec<StockLineView>,
}

impl From<&CategoryGroup<'_>> for CategoryStockView {
    fn from(group: &CategoryGroup<'_>) -> Self {
        let (subcategories, products) = if group.has_subcategories() {
            (group.subcategories.iter().map(SubcategoryStockView::from).collect(), Vec::new())
        } else {
            (Vec::new(), group.products.iter().map(|p| StockLineView::from(*p)).collect())
        };
        Self {
            name: group.name.clone(),
            stock: group.stock,
            product_count: group.products.len(),
            subcategories,
            products,
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub loading: bool,
    pub counters: DashboardCounters,
    pub total_stock: i64,
    pub groups: Vec<CategoryStockView>,
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> impl IntoResponse {
    let catalog = state.catalog();
    let products = catalog.products.data();
    let categories = catalog.categories.data();
    let subcategories = catalog.subcategories.data();

    let breakdown = StockBreakdown::build(&products, &categories, &subcategories);

    DashboardTemplate {
        layout: Layout::new(&state, Some(admin), "/"),
        loading: catalog.is_loading(),
        counters: DashboardCounters::compute(&products, &categories),
        total_stock: breakdown.total_stock,
        groups: breakdown.groups.iter().map(CategoryStockView::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use candela_core::catalog::{Category, Subcategory};
    use candela_core::{CategoryId, Price, ProductId, SubcategoryId};
    use chrono::Utc;

    use super::*;

    fn category(id: i32, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            description: String::new(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn subcategory(id: i32, category: i32, name: &str) -> Subcategory {
        Subcategory {
            id: SubcategoryId::new(id),
            name: name.to_string(),
            description: String::new(),
            category_id: CategoryId::new(category),
            category_name: String::new(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(id: i32, stock: i32, category: Option<i32>, subcategory: Option<i32>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Vela {id}"),
            description: String::new(),
            price: Price::from_pesos(20_000),
            stock,
            category_id: category.map(CategoryId::new),
            category_name: String::new(),
            subcategory_id: subcategory.map(SubcategoryId::new),
            subcategory_name: String::new(),
            images: Vec::new(),
            aroma: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_views_split_only_subcategorized_categories() {
        let categories = vec![category(1, "Aromáticas"), category(2, "Decorativas")];
        let subcategories = vec![subcategory(10, 1, "Soya")];
        let products = vec![
            product(1, 3, Some(1), Some(10)),
            product(2, 0, Some(1), None),
            product(3, 5, Some(2), None),
        ];

        let breakdown = StockBreakdown::build(&products, &categories, &subcategories);
        let views: Vec<CategoryStockView> =
            breakdown.groups.iter().map(CategoryStockView::from).collect();

        let aromaticas = views.first().unwrap_or_else(|| panic!("missing group"));
        assert_eq!(aromaticas.stock, 3);
        assert_eq!(aromaticas.product_count, 2);
        let names: Vec<&str> = aromaticas.subcategories.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Soya", "Sin subcategoría"]);
        assert!(aromaticas.products.is_empty());

        let decorativas = views.get(1).unwrap_or_else(|| panic!("missing group"));
        assert!(decorativas.subcategories.is_empty());
        assert_eq!(
            decorativas.products,
            vec![StockLineView {
                name: "Vela 3".to_string(),
                stock: 5,
                out_of_stock: false,
            }]
        );
    }
}
