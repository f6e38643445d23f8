//! Subcategory repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use candela_core::catalog::{DependencyReport, RenamePlan, Subcategory, SubcategoryInput};
use candela_core::{CategoryId, SubcategoryId};

use super::categories::count;
use super::{RepositoryError, notify};
use crate::live::Collection;

#[derive(sqlx::FromRow)]
struct SubcategoryRow {
    id: SubcategoryId,
    name: String,
    description: String,
    category_id: CategoryId,
    category_name: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubcategoryRow> for Subcategory {
    fn from(row: SubcategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            category_id: row.category_id,
            category_name: row.category_name,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for subcategory documents.
pub struct SubcategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubcategoryRepository<'a> {
    /// Create a new subcategory repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every subcategory, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Subcategory>, RepositoryError> {
        let rows: Vec<SubcategoryRow> = sqlx::query_as(
            r"
            SELECT id, name, description, category_id, category_name, active,
                   created_at, updated_at
            FROM candela.subcategory
            ORDER BY created_at, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Subcategory::from).collect())
    }

    /// Get a subcategory by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: SubcategoryId) -> Result<Option<Subcategory>, RepositoryError> {
        let row: Option<SubcategoryRow> = sqlx::query_as(
            r"
            SELECT id, name, description, category_id, category_name, active,
                   created_at, updated_at
            FROM candela.subcategory
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Subcategory::from))
    }

    /// Insert a new active subcategory under `category_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a sibling already has the name.
    pub async fn create(
        &self,
        category_id: CategoryId,
        category_name: &str,
        input: &SubcategoryInput,
    ) -> Result<SubcategoryId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: SubcategoryId = sqlx::query_scalar(
            r"
            INSERT INTO candela.subcategory (name, description, category_id, category_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(category_id)
        .bind(category_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "subcategory name already exists"))?;

        notify(&mut *tx, Collection::Subcategories).await?;
        tx.commit().await?;

        tracing::info!(subcategory_id = %id, %category_id, name = %input.name, "Subcategory created");
        Ok(id)
    }

    /// Save name and description, rewriting `subcategory_name` on products when renamed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no subcategory has this ID, or
    /// `RepositoryError::Conflict` if a sibling already has the new name.
    pub async fn update(
        &self,
        id: SubcategoryId,
        input: &SubcategoryInput,
        rename: Option<&RenamePlan>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE candela.subcategory
            SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "subcategory name already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        notify(&mut *tx, Collection::Subcategories).await?;

        if let Some(plan) = rename.filter(|p| !p.products.is_empty()) {
            sqlx::query(
                r"
                UPDATE candela.product
                SET subcategory_name = $2, updated_at = NOW()
                WHERE id = ANY($1)
                ",
            )
            .bind(&plan.products)
            .bind(&plan.new_name)
            .execute(&mut *tx)
            .await?;
            notify(&mut *tx, Collection::Products).await?;
        }

        tx.commit().await?;

        tracing::info!(
            subcategory_id = %id,
            renamed = rename.is_some(),
            products = rename.map_or(0, |p| p.products.len()),
            "Subcategory updated"
        );
        Ok(())
    }

    /// Count active products that still reference this subcategory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn dependency_report(
        &self,
        id: SubcategoryId,
    ) -> Result<DependencyReport, RepositoryError> {
        let products: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM candela.product WHERE subcategory_id = $1 AND active",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(DependencyReport {
            active_products: count(products)?,
            active_subcategories: 0,
        })
    }
}
