//! Product management route handlers.
//!
//! The list reads the live snapshot; the forms read and write the database
//! directly. Saving goes through [`crate::services::catalog`], which owns the
//! write-then-upload sequence and its partial failure.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use candela_core::catalog::model::MAX_PRODUCT_IMAGES;
use candela_core::catalog::{
    Category, CurrentParents, Product, ProductInput, Subcategory, ValidationError,
};
use candela_core::pagination::{ADMIN_PAGE_SIZE, Page};
use candela_core::{CategoryId, ProductId, SubcategoryId};
use candela_data::Collection;
use candela_data::db::ProductRepository;
use candela_data::storage::MAX_IMAGE_BYTES;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::routes::{Layout, Notice, refresh_after_write};
use crate::services::catalog::{
    ImageUpload, SaveOutcome, SaveTarget, check_images, save_product,
};
use crate::state::AppState;

/// Room for a full set of images plus the text fields.
const PRODUCT_FORM_LIMIT: usize = MAX_PRODUCT_IMAGES * MAX_IMAGE_BYTES + 1024 * 1024;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/new", get(new))
        .route("/products/{id}", post(update))
        .route("/products/{id}/edit", get(edit).post(update))
        .route("/products/{id}/toggle", post(toggle))
        .layer(DefaultBodyLimit::max(PRODUCT_FORM_LIMIT))
}

// =============================================================================
// List
// =============================================================================

/// Product list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub notice: Option<String>,
}

/// Product row for the list table.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: ProductId,
    pub name: String,
    pub category_name: String,
    pub subcategory_name: String,
    pub price: i64,
    pub stock: i32,
    pub image: Option<String>,
    pub active: bool,
}

impl From<&Product> for ProductRowView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            category_name: product.category_name.clone(),
            subcategory_name: product.subcategory_name.clone(),
            price: product.price.pesos(),
            stock: product.stock,
            image: product.primary_image().map(str::to_owned),
            active: product.active,
        }
    }
}

/// A pager link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLink {
    pub number: usize,
    pub current: bool,
}

/// One link per page, marking the current one.
#[must_use]
pub fn page_links(page: &Page) -> Vec<PageLink> {
    page.numbers()
        .into_iter()
        .map(|number| PageLink {
            number,
            current: number == page.number,
        })
        .collect()
}

/// Products list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductListTemplate {
    pub layout: Layout,
    pub loading: bool,
    pub notice: Option<Notice>,
    pub products: Vec<ProductRowView>,
    pub page: Page,
    pub page_links: Vec<PageLink>,
}

/// Products list page handler, newest first, ten per page.
///
/// GET /products
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let catalog = state.catalog();
    let products = catalog.products.data();
    let newest_first: Vec<&Product> = products.iter().rev().collect();
    let page = Page::new(query.page.unwrap_or(1), newest_first.len(), ADMIN_PAGE_SIZE);

    ProductListTemplate {
        layout: Layout::new(&state, Some(admin), "/products"),
        loading: catalog.is_loading(),
        notice: query.notice.as_deref().and_then(Notice::from_code),
        products: page
            .slice(&newest_first)
            .iter()
            .map(|p| ProductRowView::from(*p))
            .collect(),
        page_links: page_links(&page),
        page,
    }
}

// =============================================================================
// Form
// =============================================================================

/// The product form as submitted.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category_id: String,
    pub subcategory_id: String,
    pub aroma: String,
    /// Current image URLs the admin left checked.
    pub keep_images: Vec<String>,
    pub uploads: Vec<ImageUpload>,
}

impl ProductForm {
    /// Read every field of the multipart body.
    ///
    /// File inputs left empty arrive as a part with no name and no bytes and
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a malformed body.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid form data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            if name == "images" {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read image: {e}")))?;
                if bytes.is_empty() && file_name.as_deref().is_none_or(str::is_empty) {
                    continue;
                }
                form.uploads.push(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid form field: {e}")))?;
            match name.as_str() {
                "name" => form.name = value,
                "description" => form.description = value,
                "price" => form.price = value,
                "stock" => form.stock = value,
                "category_id" => form.category_id = value,
                "subcategory_id" => form.subcategory_id = value,
                "aroma" => form.aroma = value,
                "keep_image" => form.keep_images.push(value),
                _ => {}
            }
        }

        Ok(form)
    }

    /// The checked images that really belong to the product, in their
    /// current order.
    #[must_use]
    pub fn kept_images(&self, current: &[String]) -> Vec<String> {
        current
            .iter()
            .filter(|url| self.keep_images.contains(url))
            .cloned()
            .collect()
    }

    /// Validation input for the core rules.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when a selected id is not a number.
    pub fn input(&self, image_count: usize) -> std::result::Result<ProductInput, ValidationError> {
        Ok(ProductInput {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price.clone(),
            stock: self.stock.clone(),
            category_id: CategoryId::parse_optional(&self.category_id)
                .map_err(|_| ValidationError::UnknownCategory)?,
            subcategory_id: SubcategoryId::parse_optional(&self.subcategory_id)
                .map_err(|_| ValidationError::SubcategoryMismatch)?,
            aroma: self.aroma.clone(),
            image_count,
        })
    }

    /// The submitted values, for re-rendering the form.
    #[must_use]
    pub fn view(&self, images: Vec<String>) -> ProductFormView {
        ProductFormView {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price.clone(),
            stock: self.stock.clone(),
            category_id: CategoryId::parse_optional(&self.category_id).ok().flatten(),
            subcategory_id: SubcategoryId::parse_optional(&self.subcategory_id)
                .ok()
                .flatten(),
            aroma: self.aroma.clone(),
            images,
        }
    }
}

/// Values shown in the product form.
#[derive(Debug, Clone, Default)]
pub struct ProductFormView {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    pub aroma: String,
    pub images: Vec<String>,
}

impl From<&Product> for ProductFormView {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.pesos().to_string(),
            stock: product.stock.to_string(),
            category_id: product.category_id,
            subcategory_id: product.subcategory_id,
            aroma: product.aroma.clone().unwrap_or_default(),
            images: product.images.clone(),
        }
    }
}

/// A selectable subcategory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcategoryOption {
    pub id: SubcategoryId,
    pub name: String,
    pub active: bool,
    pub selected: bool,
}

/// A selectable category with its subcategories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    pub id: CategoryId,
    pub name: String,
    pub active: bool,
    pub selected: bool,
    pub subcategories: Vec<SubcategoryOption>,
}

/// Select options: active categories and subcategories, plus the product's
/// current parents even when they have been deactivated.
#[must_use]
pub fn category_options(
    categories: &[Category],
    subcategories: &[Subcategory],
    form: &ProductFormView,
    current: CurrentParents,
) -> Vec<CategoryOption> {
    categories
        .iter()
        .filter(|c| current.allows_category(c))
        .map(|c| CategoryOption {
            id: c.id,
            name: c.name.clone(),
            active: c.active,
            selected: form.category_id == Some(c.id),
            subcategories: subcategories
                .iter()
                .filter(|s| s.category_id == c.id && current.allows_subcategory(s))
                .map(|s| SubcategoryOption {
                    id: s.id,
                    name: s.name.clone(),
                    active: s.active,
                    selected: form.subcategory_id == Some(s.id),
                })
                .collect(),
        })
        .collect()
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub product_id: Option<ProductId>,
    pub form: ProductFormView,
    pub categories: Vec<CategoryOption>,
    pub has_subcategories: bool,
    pub error: Option<String>,
    pub warning: Option<String>,
    pub max_images: usize,
}

impl ProductFormTemplate {
    fn new(
        state: &AppState,
        admin: CurrentAdmin,
        product_id: Option<ProductId>,
        current: CurrentParents,
        form: ProductFormView,
    ) -> Self {
        let catalog = state.catalog();
        let categories = category_options(
            &catalog.categories.data(),
            &catalog.subcategories.data(),
            &form,
            current,
        );
        Self {
            layout: Layout::new(state, Some(admin), "/products"),
            product_id,
            has_subcategories: categories.iter().any(|c| !c.subcategories.is_empty()),
            categories,
            form,
            error: None,
            warning: None,
            max_images: MAX_PRODUCT_IMAGES,
        }
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }

    /// URL the form posts to.
    #[must_use]
    pub fn action(&self) -> String {
        self.product_id
            .map_or_else(|| "/products".to_owned(), |id| format!("/products/{id}"))
    }

    /// How many more files may be picked.
    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.max_images.saturating_sub(self.form.images.len())
    }
}

async fn load_product(state: &AppState, id: &str) -> Result<Product> {
    let id: ProductId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("producto {id}")))?;
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("producto {id}")))
}

/// New product form.
///
/// GET /products/new
#[instrument(skip_all)]
pub async fn new(State(state): State<AppState>, RequireAdminAuth(admin): RequireAdminAuth) -> impl IntoResponse {
    ProductFormTemplate::new(
        &state,
        admin,
        None,
        CurrentParents::default(),
        ProductFormView::default(),
    )
}

/// Edit product form.
///
/// GET /products/{id}/edit
#[instrument(skip(state, admin))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Response> {
    let product = load_product(&state, &id).await?;
    Ok(ProductFormTemplate::new(
        &state,
        admin,
        Some(product.id),
        CurrentParents::of(&product),
        ProductFormView::from(&product),
    )
    .into_response())
}

/// Create a product.
///
/// POST /products
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    multipart: Multipart,
) -> Result<Response> {
    let form = ProductForm::read(multipart).await?;
    save(&state, admin, SaveTarget::Create, CurrentParents::default(), &[], form).await
}

/// Update a product.
///
/// POST /products/{id}
#[instrument(skip(state, admin, multipart))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let product = load_product(&state, &id).await?;
    let form = ProductForm::read(multipart).await?;
    save(
        &state,
        admin,
        SaveTarget::Update(product.id),
        CurrentParents::of(&product),
        &product.images,
        form,
    )
    .await
}

/// Validate, write, upload. Validation and total failures re-render the
/// form with the input; a partial failure re-renders it as an edit form of
/// the saved product.
///
/// `current` are the parents stored before this save; they stay valid
/// choices even when inactive.
async fn save(
    state: &AppState,
    admin: CurrentAdmin,
    target: SaveTarget,
    current: CurrentParents,
    current_images: &[String],
    mut form: ProductForm,
) -> Result<Response> {
    let product_id = match target {
        SaveTarget::Create => None,
        SaveTarget::Update(id) => Some(id),
    };
    let kept = form.kept_images(current_images);
    let rerender = |form: &ProductForm, error: String| {
        ProductFormTemplate::new(
            state,
            admin.clone(),
            product_id,
            current,
            form.view(current_images.to_vec()),
        )
        .with_error(error)
        .into_response()
    };

    let catalog = state.catalog();
    let draft = match form
        .input(kept.len() + form.uploads.len())
        .and_then(|input| {
            input.validate(
                &catalog.categories.data(),
                &catalog.subcategories.data(),
                current,
            )
        })
    {
        Ok(draft) => draft,
        Err(e) => return Ok(rerender(&form, e.to_string())),
    };

    let images = match check_images(std::mem::take(&mut form.uploads)) {
        Ok(images) => images,
        Err(e) => return Ok(rerender(&form, e.to_string())),
    };

    let outcome = save_product(
        &ProductRepository::new(state.pool()),
        state.media(),
        target,
        &draft,
        kept.clone(),
        images,
        Utc::now().timestamp_millis(),
    )
    .await;
    refresh_after_write(state, &[Collection::Products]).await;

    match outcome {
        Ok(SaveOutcome::Saved(id)) => {
            tracing::info!(product_id = %id, "Product saved");
            let notice = match target {
                SaveTarget::Create => "product_created",
                SaveTarget::Update(_) => "product_updated",
            };
            Ok(Redirect::to(&format!("/products?notice={notice}")).into_response())
        }
        Ok(outcome @ SaveOutcome::PartiallySaved { id, .. }) => {
            let images = match ProductRepository::new(state.pool()).get(id).await {
                Ok(Some(product)) => product.images,
                Ok(None) | Err(_) => kept,
            };
            let saved_parents = CurrentParents {
                category_id: draft.category_id,
                subcategory_id: draft.subcategory_id,
            };
            let template =
                ProductFormTemplate::new(state, admin.clone(), Some(id), saved_parents, form.view(images));
            Ok(template.with_warning(outcome.warning()).into_response())
        }
        Err(e) => {
            tracing::error!(error = ?e, "Product save failed");
            Ok(rerender(&form, e.to_string()))
        }
    }
}

// =============================================================================
// Toggle
// =============================================================================

/// Hidden field carrying the list page to return to.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnPage {
    pub page: Option<usize>,
}

/// Flip a product's active flag. Inactive products leave the storefront.
///
/// POST /products/{id}/toggle
#[instrument(skip(state))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
    Form(form): Form<ReturnPage>,
) -> Result<Redirect> {
    let product = load_product(&state, &id).await?;
    let active = !product.active;
    ProductRepository::new(state.pool())
        .set_active(product.id, active)
        .await?;
    refresh_after_write(&state, &[Collection::Products]).await;

    let notice = if active {
        "product_activated"
    } else {
        "product_deactivated"
    };
    Ok(Redirect::to(&format!(
        "/products?page={}&notice={notice}",
        form.page.unwrap_or(1)
    )))
}

#[cfg(test)]
mod tests {
    use candela_core::Price;
    use candela_core::catalog::CatalogFilter;

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

    fn form() -> ProductForm {
        ProductForm {
            name: "Vela de lavanda".to_string(),
            price: "$ 42.000".to_string(),
            stock: "3".to_string(),
            category_id: "1".to_string(),
            subcategory_id: "10".to_string(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_input_validates_with_core_rules() {
        let draft = form()
            .input(0)
            .and_then(|input| {
                input.validate(
                    &[category(1, "Aromáticas")],
                    &[subcategory(10, 1, "Soya")],
                    CurrentParents::default(),
                )
            });
        let draft = draft.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(draft.price, Price::from_pesos(42_000));
        assert_eq!(draft.category_name, "Aromáticas");
        assert_eq!(draft.subcategory_name, "Soya");
    }

    #[test]
    fn test_input_rejects_garbage_ids() {
        let mut form = form();
        form.category_id = "velas".to_string();
        assert_eq!(form.input(0).err(), Some(ValidationError::UnknownCategory));
    }

    #[test]
    fn test_too_many_images() {
        let input = form().input(MAX_PRODUCT_IMAGES + 1);
        let result = input.and_then(|i| {
            i.validate(&[category(1, "A")], &[subcategory(10, 1, "S")], CurrentParents::default())
        });
        assert_eq!(result.err(), Some(ValidationError::TooManyImages));
    }

    #[test]
    fn test_kept_images_ignore_foreign_urls() {
        let mut form = form();
        form.keep_images = vec![
            "/media/products/1/1-5.jpg".to_string(),
            "https://elsewhere.example/x.jpg".to_string(),
        ];
        let current = vec![
            "/media/products/1/0-5.jpg".to_string(),
            "/media/products/1/1-5.jpg".to_string(),
        ];
        assert_eq!(form.kept_images(&current), vec!["/media/products/1/1-5.jpg".to_string()]);
    }

    #[test]
    fn test_category_options_mark_selection() {
        let view = form().view(Vec::new());
        let options = category_options(
            &[category(1, "Aromáticas"), category(2, "Decorativas")],
            &[subcategory(10, 1, "Soya"), subcategory(20, 2, "Flores")],
            &view,
            CurrentParents::default(),
        );
        assert!(options.first().is_some_and(|c| c.selected));
        let soya = options.first().and_then(|c| c.subcategories.first());
        assert!(soya.is_some_and(|s| s.selected && s.name == "Soya"));
        assert!(options.get(1).is_some_and(|c| !c.selected && c.subcategories.len() == 1));
    }

    fn product_in(category: i32, subcategory: Option<i32>) -> Product {
        Product {
            id: ProductId::new(7),
            name: "Vela de Navidad".to_string(),
            description: String::new(),
            price: Price::from_pesos(38_000),
            stock: 2,
            category_id: Some(CategoryId::new(category)),
            category_name: "Navidad".to_string(),
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
    fn test_inactive_categories_hidden_from_new_products() {
        let mut retired = category(1, "Navidad");
        retired.active = false;
        let mut retired_sub = subcategory(10, 2, "Temporada");
        retired_sub.active = false;

        let options = category_options(
            &[retired, category(2, "Aromáticas")],
            &[retired_sub, subcategory(11, 2, "Soya")],
            &ProductFormView::default(),
            CurrentParents::default(),
        );

        let names: Vec<&str> = options.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Aromáticas"]);
        let subs: Vec<&str> = options
            .iter()
            .flat_map(|c| c.subcategories.iter().map(|s| s.name.as_str()))
            .collect();
        assert_eq!(subs, vec!["Soya"]);
    }

    #[test]
    fn test_stock_edit_keeps_orphan_in_its_inactive_category() {
        let mut retired = category(1, "Navidad");
        retired.active = false;
        let categories = vec![retired, category(2, "Aromáticas")];
        let active: Vec<Category> = categories.iter().filter(|c| c.active).cloned().collect();
        let product = product_in(1, None);
        let current = CurrentParents::of(&product);
        assert!(
            CatalogFilter::default()
                .visible_products(std::slice::from_ref(&product), &active, &[])
                .is_empty()
        );

        let options = category_options(&categories, &[], &ProductFormView::from(&product), current);
        let navidad = options.iter().find(|c| c.id == CategoryId::new(1));
        assert!(navidad.is_some_and(|c| c.selected && !c.active));

        let submitted = ProductForm {
            name: product.name.clone(),
            price: "38000".to_string(),
            stock: "9".to_string(),
            category_id: "1".to_string(),
            ..ProductForm::default()
        };
        let draft = submitted
            .input(0)
            .and_then(|input| input.validate(&categories, &[], current))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(draft.category_id, Some(CategoryId::new(1)));
        assert_eq!(draft.stock, 9);

        let edited = Product {
            stock: draft.stock,
            category_id: draft.category_id,
            ..product
        };
        assert!(
            CatalogFilter::default()
                .visible_products(std::slice::from_ref(&edited), &active, &[])
                .is_empty()
        );
    }

    #[test]
    fn test_inactive_category_rejected_unless_current() {
        let mut retired = category(1, "Navidad");
        retired.active = false;
        let categories = vec![retired, category(2, "Aromáticas")];

        let moved_in = ProductForm {
            category_id: "1".to_string(),
            subcategory_id: String::new(),
            ..form()
        };
        let current = CurrentParents::of(&product_in(2, None));
        let result = moved_in
            .input(0)
            .and_then(|input| input.validate(&categories, &[], current));
        assert_eq!(result.err(), Some(ValidationError::InactiveCategory));
    }

    #[test]
    fn test_page_links_mark_current() {
        let page = Page::new(2, 25, ADMIN_PAGE_SIZE);
        let links = page_links(&page);
        assert_eq!(links.len(), 3);
        let current: Vec<usize> = links.iter().filter(|l| l.current).map(|l| l.number).collect();
        assert_eq!(current, vec![2]);
    }
}
