//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use candela_core::CategoryId;
use candela_core::catalog::{CatalogFilter, Category, Product};

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::Layout;
use crate::routes::products::ProductCardView;
use crate::state::AppState;

/// Products shown in the "Nuestros productos" section.
const LATEST_LIMIT: usize = 6;

// =============================================================================
// Static content
// =============================================================================

/// A candle type tile.
pub struct CandleType {
    pub icon: &'static str,
    pub name: &'static str,
}

pub const CANDLE_TYPES: &[CandleType] = &[
    CandleType { icon: "🌿", name: "Velas de Soya" },
    CandleType { icon: "🍯", name: "Velas de Cera de Abeja" },
    CandleType { icon: "🌸", name: "Velas Decorativas" },
    CandleType { icon: "💐", name: "Velas Aromáticas" },
];

/// A customer testimonial.
pub struct Review {
    pub stars: usize,
    pub text: &'static str,
    pub author: &'static str,
}

impl Review {
    #[must_use]
    pub fn star_glyphs(&self) -> String {
        "★".repeat(self.stars)
    }
}

pub const REVIEWS: &[Review] = &[
    Review {
        stars: 5,
        text: "Las velas más hermosas que he tenido. El aroma a coco me transporta directamente al Caribe.",
        author: "María Martínez, Bogotá",
    },
    Review {
        stars: 5,
        text: "Compré el pack de lavanda y sándalo para regalar y quedaron fascinados. El aroma dura muchísimo.",
        author: "Andrés Gómez, Medellín",
    },
    Review {
        stars: 5,
        text: "Calidad artesanal increíble. Se nota que están hechas con amor y buenos materiales.",
        author: "Lucía Herrera, Cali",
    },
];

// =============================================================================
// Views
// =============================================================================

/// Category card linking into the filtered catalog.
pub struct CategoryCardView {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub product_count: usize,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub loading: bool,
    pub categories: Vec<CategoryCardView>,
    pub latest_products: Vec<ProductCardView>,
    pub candle_types: &'static [CandleType],
    pub reviews: &'static [Review],
}

/// Display the home page.
#[instrument(skip(state, user))]
pub async fn home(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    let catalog = state.catalog();
    let products = catalog.products.data();
    let categories = catalog.active_categories();
    let subcategories = catalog.active_subcategories();

    let visible = CatalogFilter::default().visible_products(&products, &categories, &subcategories);

    HomeTemplate {
        layout: Layout::new(&state, user),
        loading: catalog.is_loading(),
        categories: category_cards(&categories, &visible),
        latest_products: latest(&visible),
        candle_types: CANDLE_TYPES,
        reviews: REVIEWS,
    }
}

/// Active categories with their number of visible products, in category order.
fn category_cards(categories: &[Category], visible: &[&Product]) -> Vec<CategoryCardView> {
    categories
        .iter()
        .map(|category| CategoryCardView {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
            product_count: visible
                .iter()
                .filter(|p| p.category_id == Some(category.id))
                .count(),
        })
        .collect()
}

/// The newest visible products.
fn latest(visible: &[&Product]) -> Vec<ProductCardView> {
    visible
        .iter()
        .rev()
        .take(LATEST_LIMIT)
        .map(|p| ProductCardView::from(*p))
        .collect()
}
