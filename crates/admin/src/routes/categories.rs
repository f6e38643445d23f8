//! Category management route handlers.
//!
//! One page lists every category, active or not, with its subcategories.
//! Deactivation and deletion follow the cascade rules: deactivating a
//! category with active dependents asks for confirmation first and takes its
//! subcategories with it; deleting is refused while anything active still
//! points at the category.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::post,
};
use serde::Deserialize;
use tracing::instrument;

use candela_core::catalog::cascade::{
    check_category_dependencies, check_subcategory_dependencies, delete_category_plan,
    rename_category_plan, toggle_category_plan,
};
use candela_core::catalog::{
    Category, CategoryInput, DependencyReport, Product, Subcategory, SubcategoryInput,
    ValidationError,
};
use candela_core::{CategoryId, SubcategoryId};
use candela_data::db::{
    CascadeRepository, CategoryRepository, ProductRepository, SubcategoryRepository,
};
use candela_data::{Collection, RepositoryError};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::routes::{Layout, Notice, SAVE_FAILED_MESSAGE, refresh_after_write};
use crate::state::AppState;

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", axum::routing::get(index).post(create))
        .route("/categories/{id}", post(update))
        .route("/categories/{id}/toggle", post(toggle))
        .route("/categories/{id}/delete", post(delete))
        .route("/categories/{id}/subcategories", post(create_subcategory))
}

// =============================================================================
// Views
// =============================================================================

/// Name and description as typed in a category or subcategory form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Which form on the page a submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    NewCategory,
    EditCategory(CategoryId),
    NewSubcategory(CategoryId),
    EditSubcategory(SubcategoryId),
}

/// A rejected submission, re-rendered in place with what the admin typed.
#[derive(Debug, Clone)]
pub struct FailedForm {
    pub target: FormTarget,
    pub values: NameForm,
    pub error: String,
}

impl FailedForm {
    #[must_use]
    pub fn invalid(target: FormTarget, values: NameForm, err: &ValidationError) -> Self {
        Self {
            target,
            values,
            error: err.to_string(),
        }
    }

    /// A failed write. A unique-name conflict caught by the database reads
    /// as `duplicate`; anything else is logged and shown as the generic error.
    #[must_use]
    pub fn write_error(
        target: FormTarget,
        values: NameForm,
        err: &RepositoryError,
        duplicate: ValidationError,
    ) -> Self {
        let error = match err {
            RepositoryError::Conflict(_) => duplicate.to_string(),
            other => {
                tracing::error!(error = %other, form = ?target, "Catalog write failed");
                SAVE_FAILED_MESSAGE.to_string()
            }
        };
        Self {
            target,
            values,
            error,
        }
    }
}

/// Values and inline error of one name/description form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub description: String,
    pub error: Option<String>,
    /// Expand the enclosing `<details>`.
    pub open: bool,
}

impl FormState {
    fn stored(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }

    /// The failed submission when it came from `target`, otherwise `fallback`.
    #[must_use]
    pub fn for_target(failed: Option<&FailedForm>, target: FormTarget, fallback: Self) -> Self {
        match failed {
            Some(failed) if failed.target == target => Self {
                name: failed.values.name.clone(),
                description: failed.values.description.clone(),
                error: Some(failed.error.clone()),
                open: true,
            },
            _ => fallback,
        }
    }
}

/// A subcategory row.
#[derive(Debug, Clone)]
pub struct SubcategoryView {
    pub id: SubcategoryId,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub edit: FormState,
}

/// A category block with its subcategories.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub product_count: usize,
    pub subcategories: Vec<SubcategoryView>,
    pub edit: FormState,
    pub new_subcategory: FormState,
}

/// Categories in creation order, each with its subcategories. The form a
/// failed submission came from carries the typed values instead of the
/// stored ones.
#[must_use]
pub fn category_views(
    categories: &[Category],
    subcategories: &[Subcategory],
    products: &[Product],
    failed: Option<&FailedForm>,
) -> Vec<CategoryView> {
    categories
        .iter()
        .map(|c| CategoryView {
            id: c.id,
            name: c.name.clone(),
            description: c.description.clone(),
            active: c.active,
            product_count: products
                .iter()
                .filter(|p| p.category_id == Some(c.id))
                .count(),
            subcategories: subcategories
                .iter()
                .filter(|s| s.category_id == c.id)
                .map(|s| SubcategoryView {
                    id: s.id,
                    name: s.name.clone(),
                    description: s.description.clone(),
                    active: s.active,
                    edit: FormState::for_target(
                        failed,
                        FormTarget::EditSubcategory(s.id),
                        FormState::stored(&s.name, &s.description),
                    ),
                })
                .collect(),
            edit: FormState::for_target(
                failed,
                FormTarget::EditCategory(c.id),
                FormState::stored(&c.name, &c.description),
            ),
            new_subcategory: FormState::for_target(
                failed,
                FormTarget::NewSubcategory(c.id),
                FormState::default(),
            ),
        })
        .collect()
}

/// A dialog listing active dependents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDialog {
    pub title: String,
    pub intro: &'static str,
    pub lines: Vec<String>,
    pub advice: &'static str,
    /// Set when the dialog asks to confirm a deactivation.
    pub confirm_action: Option<String>,
}

impl DependencyDialog {
    /// Warning before deactivating a category that still has active dependents.
    #[must_use]
    pub fn deactivate(category: &Category, report: DependencyReport) -> Self {
        let mut lines = Vec::new();
        if report.active_subcategories > 0 {
            lines.push(DependencyReport {
                active_products: 0,
                ..report
            }
            .to_string());
        }
        if report.active_products > 0 {
            lines.push(format!(
                "{} (no se desactivan automáticamente)",
                DependencyReport {
                    active_subcategories: 0,
                    ..report
                }
            ));
        }
        Self {
            title: format!("Desactivar \"{}\"", category.name),
            intro: "Al desactivar esta categoría también se desactivarán:",
            lines,
            advice: "¿Continuar?",
            confirm_action: Some(format!("/categories/{}/toggle", category.id)),
        }
    }

    /// Refusal to delete a category.
    #[must_use]
    pub fn blocked_category(category: &Category, report: DependencyReport) -> Self {
        Self {
            title: format!("No se puede eliminar \"{}\"", category.name),
            intro: "Esta categoría tiene dependencias activas:",
            lines: report.lines(),
            advice: "Desactiva o reasigna los productos y subcategorías antes de eliminar la categoría.",
            confirm_action: None,
        }
    }

    /// Refusal to delete a subcategory.
    #[must_use]
    pub fn blocked_subcategory(subcategory: &Subcategory, report: DependencyReport) -> Self {
        Self {
            title: format!("No se puede eliminar \"{}\"", subcategory.name),
            intro: "Esta subcategoría tiene dependencias activas:",
            lines: report.lines(),
            advice: "Desactiva o reasigna los productos antes de eliminar la subcategoría.",
            confirm_action: None,
        }
    }
}

/// Categories page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CategoriesQuery {
    pub notice: Option<String>,
    /// Category whose deactivation needs confirming.
    pub confirm_toggle: Option<String>,
    /// Category whose deletion was refused.
    pub blocked_category: Option<String>,
    /// Subcategory whose deletion was refused.
    pub blocked_subcategory: Option<String>,
}

/// Categories page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesTemplate {
    pub layout: Layout,
    pub loading: bool,
    pub notice: Option<Notice>,
    pub dialog: Option<DependencyDialog>,
    pub categories: Vec<CategoryView>,
    pub new_category: FormState,
}

/// Everything a render of the page can carry besides the lists.
#[derive(Debug, Default)]
pub struct PageState {
    pub notice: Option<Notice>,
    pub dialog: Option<DependencyDialog>,
    pub failed: Option<FailedForm>,
}

/// Render the categories page from the live snapshots.
pub fn render_page(state: &AppState, admin: CurrentAdmin, page: PageState) -> Response {
    let catalog = state.catalog();
    let failed = page.failed.as_ref();
    CategoriesTemplate {
        layout: Layout::new(state, Some(admin), "/categories"),
        loading: catalog.is_loading(),
        notice: page.notice,
        dialog: page.dialog,
        categories: category_views(
            &catalog.categories.data(),
            &catalog.subcategories.data(),
            &catalog.products.data(),
            failed,
        ),
        new_category: FormState::for_target(failed, FormTarget::NewCategory, FormState::default()),
    }
    .into_response()
}

/// Build the dialog a redirect asked for, from the current snapshots.
fn dialog_from_query(state: &AppState, query: &CategoriesQuery) -> Option<DependencyDialog> {
    let catalog = state.catalog();
    let products = catalog.products.data();
    let categories = catalog.categories.data();
    let subcategories = catalog.subcategories.data();

    let find_category = |raw: &str| {
        raw.parse::<CategoryId>()
            .ok()
            .and_then(|id| categories.iter().find(|c| c.id == id))
    };

    if let Some(category) = query.confirm_toggle.as_deref().and_then(find_category) {
        let report = check_category_dependencies(category.id, &products, &subcategories);
        return (category.active && report.blocks_delete())
            .then(|| DependencyDialog::deactivate(category, report));
    }
    if let Some(category) = query.blocked_category.as_deref().and_then(find_category) {
        let report = check_category_dependencies(category.id, &products, &subcategories);
        return report
            .blocks_delete()
            .then(|| DependencyDialog::blocked_category(category, report));
    }
    let subcategory = query
        .blocked_subcategory
        .as_deref()
        .and_then(|raw| raw.parse::<SubcategoryId>().ok())
        .and_then(|id| subcategories.iter().find(|s| s.id == id))?;
    let report = check_subcategory_dependencies(subcategory.id, &products);
    report
        .blocks_delete()
        .then(|| DependencyDialog::blocked_subcategory(subcategory, report))
}

/// Log a failed toggle or delete and send the admin back with the generic
/// error. These forms carry no input worth keeping.
pub fn write_failed(err: &RepositoryError) -> Response {
    tracing::error!(error = %err, "Catalog write failed");
    Redirect::to("/categories?notice=save_failed").into_response()
}

/// Re-render the page with the rejected form open and its input kept.
pub fn form_failed(state: &AppState, admin: CurrentAdmin, failed: FailedForm) -> Response {
    render_page(
        state,
        admin,
        PageState {
            failed: Some(failed),
            ..PageState::default()
        },
    )
}

pub(crate) async fn load_category(state: &AppState, id: &str) -> Result<Category> {
    let id: CategoryId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("categoría {id}")))?;
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("categoría {id}")))
}

// =============================================================================
// Handlers
// =============================================================================

/// Categories page.
///
/// GET /categories
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<CategoriesQuery>,
) -> Response {
    let page = PageState {
        notice: query.notice.as_deref().and_then(Notice::from_code),
        dialog: dialog_from_query(&state, &query),
        failed: None,
    };
    render_page(&state, admin, page)
}

/// Create a category.
///
/// POST /categories
#[instrument(skip(state, admin))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<NameForm>,
) -> Result<Response> {
    let existing = CategoryRepository::new(state.pool()).list().await?;
    let input = CategoryInput {
        name: form.name.clone(),
        description: form.description.clone(),
    };
    let target = FormTarget::NewCategory;
    let input = match input.validate(&existing, None) {
        Ok(input) => input,
        Err(e) => {
            return Ok(form_failed(&state, admin, FailedForm::invalid(target, form, &e)));
        }
    };

    if let Err(e) = CategoryRepository::new(state.pool()).create(&input).await {
        let failed =
            FailedForm::write_error(target, form, &e, ValidationError::DuplicateCategory);
        return Ok(form_failed(&state, admin, failed));
    }
    refresh_after_write(&state, &[Collection::Categories]).await;
    Ok(Redirect::to("/categories?notice=category_created").into_response())
}

/// Save a category's name and description. A new name is copied onto its
/// subcategories and products in the same transaction.
///
/// POST /categories/{id}
#[instrument(skip(state, admin))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
    Form(form): Form<NameForm>,
) -> Result<Response> {
    let category = load_category(&state, &id).await?;
    let existing = CategoryRepository::new(state.pool()).list().await?;
    let target = FormTarget::EditCategory(category.id);
    let input = CategoryInput {
        name: form.name.clone(),
        description: form.description.clone(),
    };
    let input = match input.validate(&existing, Some(category.id)) {
        Ok(input) => input,
        Err(e) => {
            return Ok(form_failed(&state, admin, FailedForm::invalid(target, form, &e)));
        }
    };

    let subcategories = SubcategoryRepository::new(state.pool()).list().await?;
    let products = ProductRepository::new(state.pool()).list().await?;
    let rename = rename_category_plan(&category, &input.name, &subcategories, &products);

    if let Err(e) = CategoryRepository::new(state.pool())
        .update(category.id, &input, rename.as_ref())
        .await
    {
        let failed =
            FailedForm::write_error(target, form, &e, ValidationError::DuplicateCategory);
        return Ok(form_failed(&state, admin, failed));
    }
    refresh_after_write(
        &state,
        &[Collection::Categories, Collection::Subcategories, Collection::Products],
    )
    .await;
    Ok(Redirect::to("/categories?notice=category_updated").into_response())
}

/// Confirmation flag posted by the deactivation dialog.
#[derive(Debug, Default, Deserialize)]
pub struct ToggleForm {
    pub confirm: Option<String>,
}

impl ToggleForm {
    fn confirmed(&self) -> bool {
        self.confirm.as_deref() == Some("1")
    }
}

/// Activate or deactivate a category.
///
/// Deactivating one with active dependents first redirects to the warning
/// dialog; the dialog posts back with `confirm=1`.
///
/// POST /categories/{id}/toggle
#[instrument(skip(state))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
    Form(form): Form<ToggleForm>,
) -> Result<Response> {
    let category = load_category(&state, &id).await?;

    if category.active && !form.confirmed() {
        let report = CategoryRepository::new(state.pool())
            .dependency_report(category.id)
            .await?;
        if report.blocks_delete() {
            return Ok(
                Redirect::to(&format!("/categories?confirm_toggle={}", category.id))
                    .into_response(),
            );
        }
    }

    let subcategories = SubcategoryRepository::new(state.pool()).list().await?;
    let plan = toggle_category_plan(&category, &subcategories);
    if let Err(e) = CascadeRepository::new(state.pool()).apply(&plan).await {
        return Ok(write_failed(&e));
    }
    refresh_after_write(&state, &[Collection::Categories, Collection::Subcategories]).await;

    let notice = if plan.active {
        "category_activated"
    } else {
        "category_deactivated"
    };
    Ok(Redirect::to(&format!("/categories?notice={notice}")).into_response())
}

/// Soft-delete a category, refused while active products or subcategories
/// reference it.
///
/// POST /categories/{id}/delete
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Response> {
    let category = load_category(&state, &id).await?;
    let products = ProductRepository::new(state.pool()).list().await?;
    let subcategories = SubcategoryRepository::new(state.pool()).list().await?;

    let plan = match delete_category_plan(category.id, &products, &subcategories) {
        Ok(plan) => plan,
        Err(report) => {
            tracing::info!(category_id = %category.id, %report, "Category delete blocked");
            return Ok(
                Redirect::to(&format!("/categories?blocked_category={}", category.id))
                    .into_response(),
            );
        }
    };

    if let Err(e) = CascadeRepository::new(state.pool()).apply(&plan).await {
        return Ok(write_failed(&e));
    }
    refresh_after_write(&state, &[Collection::Categories, Collection::Subcategories]).await;
    Ok(Redirect::to("/categories?notice=category_deleted").into_response())
}

/// Add a subcategory under a category.
///
/// POST /categories/{id}/subcategories
#[instrument(skip(state, admin))]
pub async fn create_subcategory(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
    Form(form): Form<NameForm>,
) -> Result<Response> {
    let category = load_category(&state, &id).await?;
    let existing = SubcategoryRepository::new(state.pool()).list().await?;
    let target = FormTarget::NewSubcategory(category.id);
    let input = SubcategoryInput {
        name: form.name.clone(),
        description: form.description.clone(),
    };
    let input = match input.validate(category.id, &existing, None) {
        Ok(input) => input,
        Err(e) => {
            return Ok(form_failed(&state, admin, FailedForm::invalid(target, form, &e)));
        }
    };

    if let Err(e) = SubcategoryRepository::new(state.pool())
        .create(category.id, &category.name, &input)
        .await
    {
        let failed =
            FailedForm::write_error(target, form, &e, ValidationError::DuplicateSubcategory);
        return Ok(form_failed(&state, admin, failed));
    }
    refresh_after_write(&state, &[Collection::Subcategories]).await;
    Ok(Redirect::to("/categories?notice=subcategory_created").into_response())
}

#[cfg(test)]
mod tests {
    use candela_core::{Price, ProductId};
    use chrono::Utc;

    use super::*;

    fn category(id: i32, name: &str, active: bool) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            description: String::new(),
            active,
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

    fn product(id: i32, category: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Vela {id}"),
            description: String::new(),
            price: Price::from_pesos(10_000),
            stock: 1,
            category_id: Some(CategoryId::new(category)),
            category_name: String::new(),
            subcategory_id: None,
            subcategory_name: String::new(),
            images: Vec::new(),
            aroma: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_category_views_group_subcategories() {
        let views = category_views(
            &[category(1, "Aromáticas", true), category(2, "Decorativas", false)],
            &[subcategory(10, 1, "Soya"), subcategory(11, 1, "Abeja")],
            &[product(1, 1), product(2, 1), product(3, 2)],
            None,
        );
        let first = views.first().unwrap_or_else(|| panic!("missing view"));
        assert_eq!(first.subcategories.len(), 2);
        assert_eq!(first.product_count, 2);
        let second = views.get(1).unwrap_or_else(|| panic!("missing view"));
        assert!(!second.active);
        assert!(second.subcategories.is_empty());
    }

    #[test]
    fn test_failed_edit_keeps_typed_values_open() {
        let failed = FailedForm::invalid(
            FormTarget::EditSubcategory(SubcategoryId::new(11)),
            NameForm {
                name: "soya".to_string(),
                description: "Cera vegetal".to_string(),
            },
            &ValidationError::DuplicateSubcategory,
        );
        let views = category_views(
            &[category(1, "Aromáticas", true)],
            &[subcategory(10, 1, "Soya"), subcategory(11, 1, "Abeja")],
            &[],
            Some(&failed),
        );
        let view = views.first().unwrap_or_else(|| panic!("missing view"));

        let edited = view.subcategories.get(1).unwrap_or_else(|| panic!("missing row"));
        assert!(edited.edit.open);
        assert_eq!(edited.edit.name, "soya");
        assert_eq!(edited.edit.description, "Cera vegetal");
        assert_eq!(
            edited.edit.error.as_deref(),
            Some(ValidationError::DuplicateSubcategory.to_string().as_str())
        );
        assert_eq!(edited.name, "Abeja");

        let untouched = view.subcategories.first().unwrap_or_else(|| panic!("missing row"));
        assert_eq!(untouched.edit, FormState::stored("Soya", ""));
        assert_eq!(view.edit, FormState::stored("Aromáticas", ""));
        assert_eq!(view.new_subcategory, FormState::default());
    }

    #[test]
    fn test_write_errors_keep_input() {
        let values = NameForm {
            name: "Decorativas".to_string(),
            description: String::new(),
        };
        let target = FormTarget::EditCategory(CategoryId::new(2));

        let conflict = FailedForm::write_error(
            target,
            values.clone(),
            &RepositoryError::Conflict("categories_name_key".to_string()),
            ValidationError::DuplicateCategory,
        );
        assert_eq!(conflict.error, ValidationError::DuplicateCategory.to_string());
        assert_eq!(conflict.values.name, "Decorativas");

        let broken = FailedForm::write_error(
            target,
            values,
            &RepositoryError::Database(sqlx::Error::PoolTimedOut),
            ValidationError::DuplicateCategory,
        );
        assert_eq!(broken.error, SAVE_FAILED_MESSAGE);
        assert_eq!(broken.target, target);
        assert_eq!(broken.values.name, "Decorativas");
    }

    #[test]
    fn test_failed_form_renders_open_with_inline_error() {
        let failed = FailedForm::write_error(
            FormTarget::EditCategory(CategoryId::new(2)),
            NameForm {
                name: "Decorativas nuevas".to_string(),
                description: String::new(),
            },
            &RepositoryError::Database(sqlx::Error::PoolTimedOut),
            ValidationError::DuplicateCategory,
        );
        let categories = category_views(
            &[category(1, "Aromáticas", true), category(2, "Decorativas", true)],
            &[],
            &[],
            Some(&failed),
        );
        let html = CategoriesTemplate {
            layout: Layout {
                admin: None,
                store_name: "Candela".to_string(),
                current_path: "/categories",
                inactivity_secs: 600,
            },
            loading: false,
            notice: None,
            dialog: None,
            categories,
            new_category: FormState::for_target(
                Some(&failed),
                FormTarget::NewCategory,
                FormState::default(),
            ),
        }
        .render()
        .unwrap_or_else(|e| panic!("render failed: {e}"));

        assert!(html.contains("value=\"Decorativas nuevas\""));
        assert!(html.contains(SAVE_FAILED_MESSAGE));
        assert_eq!(html.matches("<details open>").count(), 1);
        assert_eq!(html.matches("field-error").count(), 1);
    }

    #[test]
    fn test_deactivate_dialog() {
        let report = DependencyReport {
            active_products: 3,
            active_subcategories: 1,
        };
        let dialog = DependencyDialog::deactivate(&category(4, "Aromáticas", true), report);
        assert_eq!(dialog.title, "Desactivar \"Aromáticas\"");
        assert_eq!(
            dialog.lines,
            vec![
                "1 subcategoría activa".to_string(),
                "3 productos activos (no se desactivan automáticamente)".to_string(),
            ]
        );
        assert_eq!(dialog.confirm_action.as_deref(), Some("/categories/4/toggle"));
    }

    #[test]
    fn test_blocked_dialogs() {
        let report = DependencyReport {
            active_products: 1,
            active_subcategories: 2,
        };
        let dialog = DependencyDialog::blocked_category(&category(1, "Velas", true), report);
        assert_eq!(dialog.title, "No se puede eliminar \"Velas\"");
        assert_eq!(dialog.lines.len(), 2);
        assert_eq!(dialog.confirm_action, None);

        let dialog = DependencyDialog::blocked_subcategory(
            &subcategory(10, 1, "Soya"),
            DependencyReport {
                active_products: 2,
                active_subcategories: 0,
            },
        );
        assert_eq!(dialog.lines, vec!["2 productos activos".to_string()]);
    }

    #[test]
    fn test_toggle_confirmation_flag() {
        assert!(ToggleForm { confirm: Some("1".to_string()) }.confirmed());
        assert!(!ToggleForm::default().confirmed());
    }
}
