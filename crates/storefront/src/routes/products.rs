//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use candela_core::ProductId;
use candela_core::catalog::{CatalogFilter, Category, Product, Subcategory};
use candela_data::db::{CategoryRepository, ProductRepository, SubcategoryRepository};

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::Layout;
use crate::state::AppState;

/// Related products shown under the detail page.
const RELATED_LIMIT: usize = 3;

/// Product card data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: Option<String>,
    pub category_name: String,
    pub aroma: Option<String>,
    pub out_of_stock: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            image: product.primary_image().map(str::to_owned),
            category_name: product.category_name.clone(),
            aroma: product.aroma.clone(),
            out_of_stock: product.is_out_of_stock(),
        }
    }
}

/// Product detail data for templates.
pub struct ProductDetailView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: String,
    pub images: Vec<String>,
    pub category_name: String,
    pub subcategory_name: String,
    pub aroma: Option<String>,
    pub stock: i32,
    pub out_of_stock: bool,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            images: product.images.clone(),
            category_name: product.category_name.clone(),
            subcategory_name: product.subcategory_name.clone(),
            aroma: product.aroma.clone(),
            stock: product.stock,
            out_of_stock: product.is_out_of_stock(),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductDetailView,
    pub related_products: Vec<ProductCardView>,
}

/// Product not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate {
    pub layout: Layout,
}

/// Display product detail page.
///
/// Unknown ids, inactive products and products whose category or
/// subcategory is inactive all render "Producto no encontrado" with a 404.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<String>,
) -> Result<Response> {
    let layout = Layout::new(&state, user);

    let Ok(id) = id.parse::<ProductId>() else {
        return Ok(not_found(layout));
    };

    let catalog = state.catalog();
    if catalog.is_loading() {
        // First snapshots not in yet; read this product and its parents directly.
        let Some(product) = ProductRepository::new(state.pool()).get(id).await? else {
            return Ok(not_found(layout));
        };
        let category = match product.category_id {
            Some(id) => CategoryRepository::new(state.pool()).get(id).await?,
            None => None,
        };
        let subcategory = match product.subcategory_id {
            Some(id) => SubcategoryRepository::new(state.pool()).get(id).await?,
            None => None,
        };
        return Ok(match visible_with_parents(product, category, subcategory) {
            Some(product) => ProductShowTemplate {
                layout,
                product: ProductDetailView::from(&product),
                related_products: Vec::new(),
            }
            .into_response(),
            None => not_found(layout),
        });
    }

    let products = catalog.products.data();
    let categories = catalog.active_categories();
    let subcategories = catalog.active_subcategories();
    let visible = CatalogFilter::default().visible_products(&products, &categories, &subcategories);
    let Some(product) = visible.iter().copied().find(|p| p.id == id) else {
        tracing::debug!(product_id = %id, "Product not visible");
        return Ok(not_found(layout));
    };

    Ok(ProductShowTemplate {
        layout,
        product: ProductDetailView::from(product),
        related_products: related(product, &visible),
    }
    .into_response())
}

/// The product, if it and every parent it points at are active.
fn visible_with_parents(
    product: Product,
    category: Option<Category>,
    subcategory: Option<Subcategory>,
) -> Option<Product> {
    let categories: Vec<Category> = category.into_iter().collect();
    let subcategories: Vec<Subcategory> = subcategory.into_iter().collect();
    let shown = !CatalogFilter::default()
        .visible_products(std::slice::from_ref(&product), &categories, &subcategories)
        .is_empty();
    shown.then_some(product)
}

fn not_found(layout: Layout) -> Response {
    (StatusCode::NOT_FOUND, ProductNotFoundTemplate { layout }).into_response()
}

/// Other visible products of the same category, newest first.
fn related(product: &Product, visible: &[&Product]) -> Vec<ProductCardView> {
    let Some(category) = product.category_id else {
        return Vec::new();
    };
    visible
        .iter()
        .rev()
        .filter(|p| p.id != product.id && p.category_id == Some(category))
        .take(RELATED_LIMIT)
        .map(|p| ProductCardView::from(*p))
        .collect()
}

#[cfg(test)]
mod tests {
    use candela_core::{CategoryId, Price, SubcategoryId};
    use chrono::Utc;

    use super::*;

    fn product(id: i32, category: Option<i32>, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Vela {id}"),
            description: String::new(),
            price: Price::from_pesos(15_000),
            stock,
            category_id: category.map(CategoryId::new),
            category_name: String::new(),
            subcategory_id: None,
            subcategory_name: String::new(),
            images: vec![format!("/media/products/{id}/0-1.jpg")],
            aroma: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_card_view() {
        let card = ProductCardView::from(&product(4, Some(1), 0));
        assert_eq!(card.price, "$ 15.000");
        assert_eq!(card.image.as_deref(), Some("/media/products/4/0-1.jpg"));
        assert!(card.out_of_stock);
    }

    #[test]
    fn test_related_same_category_newest_first() {
        let products = [
            product(1, Some(1), 3),
            product(2, Some(1), 3),
            product(3, Some(2), 3),
            product(4, Some(1), 3),
            product(5, Some(1), 3),
            product(6, Some(1), 3),
        ];
        let visible: Vec<&Product> = products.iter().collect();

        let related = related(&products[1], &visible);
        let ids: Vec<i32> = related.iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![6, 5, 4]);
    }

    fn category(id: i32, active: bool) -> Category {
        Category {
            id: CategoryId::new(id),
            name: "Aromáticas".to_string(),
            description: String::new(),
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn subcategory(id: i32, category: i32, active: bool) -> Subcategory {
        Subcategory {
            id: SubcategoryId::new(id),
            name: "Soya".to_string(),
            description: String::new(),
            category_id: CategoryId::new(category),
            category_name: "Aromáticas".to_string(),
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_direct_read_hides_orphans() {
        let shown = visible_with_parents(product(1, Some(1), 3), Some(category(1, true)), None);
        assert!(shown.is_some());

        let orphan = visible_with_parents(product(1, Some(1), 3), Some(category(1, false)), None);
        assert!(orphan.is_none());

        // Parent row gone entirely.
        assert!(visible_with_parents(product(1, Some(1), 3), None, None).is_none());

        let mut in_sub = product(2, Some(1), 3);
        in_sub.subcategory_id = Some(SubcategoryId::new(10));
        let inactive_sub = visible_with_parents(
            in_sub.clone(),
            Some(category(1, true)),
            Some(subcategory(10, 1, false)),
        );
        assert!(inactive_sub.is_none());
        let active_sub =
            visible_with_parents(in_sub, Some(category(1, true)), Some(subcategory(10, 1, true)));
        assert!(active_sub.is_some());

        let mut hidden = product(3, None, 3);
        hidden.active = false;
        assert!(visible_with_parents(hidden, None, None).is_none());
        assert!(visible_with_parents(product(4, None, 3), None, None).is_some());
    }

    #[test]
    fn test_related_uncategorized_is_empty() {
        let products = [product(1, None, 3), product(2, None, 3)];
        let visible: Vec<&Product> = products.iter().collect();
        assert!(related(&products[0], &visible).is_empty());
    }
}
