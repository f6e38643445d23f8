//! Category repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use candela_core::CategoryId;
use candela_core::catalog::{Category, CategoryInput, DependencyReport, RenamePlan};

use super::{RepositoryError, notify};
use crate::live::Collection;

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    description: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for category documents.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every category, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            r"
            SELECT id, name, description, active, created_at, updated_at
            FROM candela.category
            ORDER BY created_at, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            r"
            SELECT id, name, description, active, created_at, updated_at
            FROM candela.category
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Insert a new active category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already taken.
    pub async fn create(&self, input: &CategoryInput) -> Result<CategoryId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: CategoryId = sqlx::query_scalar(
            "INSERT INTO candela.category (name, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category name already exists"))?;

        notify(&mut *tx, Collection::Categories).await?;
        tx.commit().await?;

        tracing::info!(category_id = %id, name = %input.name, "Category created");
        Ok(id)
    }

    /// Save name and description, rewriting denormalized names when renamed.
    ///
    /// The category update and every `category_name` rewrite in `rename`
    /// commit together or not at all.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no category has this ID, or
    /// `RepositoryError::Conflict` if the new name is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
        rename: Option<&RenamePlan>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE candela.category
            SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category name already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        notify(&mut *tx, Collection::Categories).await?;

        if let Some(plan) = rename {
            if !plan.subcategories.is_empty() {
                sqlx::query(
                    r"
                    UPDATE candela.subcategory
                    SET category_name = $2, updated_at = NOW()
                    WHERE id = ANY($1)
                    ",
                )
                .bind(&plan.subcategories)
                .bind(&plan.new_name)
                .execute(&mut *tx)
                .await?;
                notify(&mut *tx, Collection::Subcategories).await?;
            }
            if !plan.products.is_empty() {
                sqlx::query(
                    r"
                    UPDATE candela.product
                    SET category_name = $2, updated_at = NOW()
                    WHERE id = ANY($1)
                    ",
                )
                .bind(&plan.products)
                .bind(&plan.new_name)
                .execute(&mut *tx)
                .await?;
                notify(&mut *tx, Collection::Products).await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            category_id = %id,
            renamed = rename.is_some(),
            subcategories = rename.map_or(0, |p| p.subcategories.len()),
            products = rename.map_or(0, |p| p.products.len()),
            "Category updated"
        );
        Ok(())
    }

    /// Count active records that still reference this category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn dependency_report(&self, id: CategoryId) -> Result<DependencyReport, RepositoryError> {
        let (products, subcategories): (i64, i64) = sqlx::query_as(
            r"
            SELECT
                (SELECT COUNT(*) FROM candela.product WHERE category_id = $1 AND active),
                (SELECT COUNT(*) FROM candela.subcategory WHERE category_id = $1 AND active)
            ",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(DependencyReport {
            active_products: count(products)?,
            active_subcategories: count(subcategories)?,
        })
    }
}

pub(super) fn count(value: i64) -> Result<usize, RepositoryError> {
    usize::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative count: {value}")))
}
