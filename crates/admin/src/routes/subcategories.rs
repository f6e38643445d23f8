//! Subcategory route handlers.
//!
//! Subcategories are listed and created from the categories page; these
//! routes handle edits, toggles and deletes and always return there.

use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::post,
};
use tracing::instrument;

use candela_core::SubcategoryId;
use candela_core::catalog::cascade::{
    delete_subcategory_plan, rename_subcategory_plan, toggle_subcategory_plan,
};
use candela_core::catalog::{Subcategory, SubcategoryInput, ValidationError};
use candela_data::db::{CascadeRepository, ProductRepository, SubcategoryRepository};
use candela_data::Collection;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::routes::categories::{FailedForm, FormTarget, NameForm, form_failed, write_failed};
use crate::routes::refresh_after_write;
use crate::state::AppState;

/// Build the subcategories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subcategories/{id}", post(update))
        .route("/subcategories/{id}/toggle", post(toggle))
        .route("/subcategories/{id}/delete", post(delete))
}

async fn load_subcategory(state: &AppState, id: &str) -> Result<Subcategory> {
    let id: SubcategoryId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("subcategoría {id}")))?;
    SubcategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("subcategoría {id}")))
}

/// Save a subcategory's name and description. A new name is copied onto its
/// products in the same transaction.
///
/// POST /subcategories/{id}
#[instrument(skip(state, admin))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<String>,
    Form(form): Form<NameForm>,
) -> Result<Response> {
    let subcategory = load_subcategory(&state, &id).await?;
    let siblings = SubcategoryRepository::new(state.pool()).list().await?;
    let target = FormTarget::EditSubcategory(subcategory.id);
    let input = SubcategoryInput {
        name: form.name.clone(),
        description: form.description.clone(),
    };
    let input = match input.validate(subcategory.category_id, &siblings, Some(subcategory.id)) {
        Ok(input) => input,
        Err(e) => {
            return Ok(form_failed(&state, admin, FailedForm::invalid(target, form, &e)));
        }
    };

    let products = ProductRepository::new(state.pool()).list().await?;
    let rename = rename_subcategory_plan(&subcategory, &input.name, &products);

    if let Err(e) = SubcategoryRepository::new(state.pool())
        .update(subcategory.id, &input, rename.as_ref())
        .await
    {
        let failed =
            FailedForm::write_error(target, form, &e, ValidationError::DuplicateSubcategory);
        return Ok(form_failed(&state, admin, failed));
    }
    refresh_after_write(&state, &[Collection::Subcategories, Collection::Products]).await;
    Ok(Redirect::to("/categories?notice=subcategory_updated").into_response())
}

/// Activate or deactivate a subcategory. Products are never touched.
///
/// POST /subcategories/{id}/toggle
#[instrument(skip(state))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Response> {
    let subcategory = load_subcategory(&state, &id).await?;
    let plan = toggle_subcategory_plan(&subcategory);
    if let Err(e) = CascadeRepository::new(state.pool()).apply(&plan).await {
        return Ok(write_failed(&e));
    }
    refresh_after_write(&state, &[Collection::Subcategories]).await;

    let notice = if plan.active {
        "subcategory_activated"
    } else {
        "subcategory_deactivated"
    };
    Ok(Redirect::to(&format!("/categories?notice={notice}")).into_response())
}

/// Soft-delete a subcategory, refused while active products reference it.
///
/// POST /subcategories/{id}/delete
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Response> {
    let subcategory = load_subcategory(&state, &id).await?;
    let products = ProductRepository::new(state.pool()).list().await?;

    let plan = match delete_subcategory_plan(subcategory.id, &products) {
        Ok(plan) => plan,
        Err(report) => {
            tracing::info!(subcategory_id = %subcategory.id, %report, "Subcategory delete blocked");
            return Ok(Redirect::to(&format!(
                "/categories?blocked_subcategory={}",
                subcategory.id
            ))
            .into_response());
        }
    };

    if let Err(e) = CascadeRepository::new(state.pool()).apply(&plan).await {
        return Ok(write_failed(&e));
    }
    refresh_after_write(&state, &[Collection::Subcategories]).await;
    Ok(Redirect::to("/categories?notice=subcategory_deleted").into_response())
}
