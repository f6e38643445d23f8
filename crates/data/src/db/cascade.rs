//! Applies soft-delete cascade plans.

use sqlx::PgPool;

use candela_core::catalog::CascadePlan;

use super::{RepositoryError, notify};
use crate::live::Collection;

/// Writes a [`CascadePlan`] in one transaction.
pub struct CascadeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CascadeRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Set `active = plan.active` on every record in the plan.
    ///
    /// Either every listed record changes or none does.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any update fails; nothing is
    /// written in that case.
    pub async fn apply(&self, plan: &CascadePlan) -> Result<(), RepositoryError> {
        if plan.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        if !plan.categories.is_empty() {
            sqlx::query(
                "UPDATE candela.category SET active = $2, updated_at = NOW() WHERE id = ANY($1)",
            )
            .bind(&plan.categories)
            .bind(plan.active)
            .execute(&mut *tx)
            .await?;
            notify(&mut *tx, Collection::Categories).await?;
        }

        if !plan.subcategories.is_empty() {
            sqlx::query(
                "UPDATE candela.subcategory SET active = $2, updated_at = NOW() WHERE id = ANY($1)",
            )
            .bind(&plan.subcategories)
            .bind(plan.active)
            .execute(&mut *tx)
            .await?;
            notify(&mut *tx, Collection::Subcategories).await?;
        }

        if !plan.products.is_empty() {
            sqlx::query(
                "UPDATE candela.product SET active = $2, updated_at = NOW() WHERE id = ANY($1)",
            )
            .bind(&plan.products)
            .bind(plan.active)
            .execute(&mut *tx)
            .await?;
            notify(&mut *tx, Collection::Products).await?;
        }

        tx.commit().await?;

        tracing::info!(
            active = plan.active,
            categories = plan.categories.len(),
            subcategories = plan.subcategories.len(),
            products = plan.products.len(),
            "Cascade applied"
        );
        Ok(())
    }
}
