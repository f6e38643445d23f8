//! Product repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use candela_core::catalog::{Product, ProductDraft};
use candela_core::{CategoryId, Price, ProductId, SubcategoryId};

use super::{RepositoryError, notify};
use crate::live::Collection;

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, category_id, category_name, \
     subcategory_id, subcategory_name, images, aroma, active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: i64,
    stock: i32,
    category_id: Option<CategoryId>,
    category_name: String,
    subcategory_id: Option<SubcategoryId>,
    subcategory_name: String,
    images: Vec<String>,
    aroma: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: Price::from_pesos(row.price),
            stock: row.stock,
            category_id: row.category_id,
            category_name: row.category_name,
            subcategory_id: row.subcategory_id,
            subcategory_name: row.subcategory_name,
            images: row.images,
            aroma: row.aroma,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product documents.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every product, active or not, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM candela.product ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM candela.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Insert a new active product without images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, draft: &ProductDraft) -> Result<ProductId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO candela.product
                (name, description, price, stock, category_id, category_name,
                 subcategory_id, subcategory_name, aroma)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price.pesos())
        .bind(draft.stock)
        .bind(draft.category_id)
        .bind(&draft.category_name)
        .bind(draft.subcategory_id)
        .bind(&draft.subcategory_name)
        .bind(draft.aroma.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        notify(&mut *tx, Collection::Products).await?;
        tx.commit().await?;

        tracing::info!(product_id = %id, name = %draft.name, "Product created");
        Ok(id)
    }

    /// Overwrite a product's editable fields. Images and the active flag are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    pub async fn update(&self, id: ProductId, draft: &ProductDraft) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE candela.product
            SET name = $2, description = $3, price = $4, stock = $5,
                category_id = $6, category_name = $7,
                subcategory_id = $8, subcategory_name = $9,
                aroma = $10, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price.pesos())
        .bind(draft.stock)
        .bind(draft.category_id)
        .bind(&draft.category_name)
        .bind(draft.subcategory_id)
        .bind(&draft.subcategory_name)
        .bind(draft.aroma.as_deref())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        notify(&mut *tx, Collection::Products).await?;
        tx.commit().await?;

        tracing::info!(product_id = %id, "Product updated");
        Ok(())
    }

    /// Replace the image list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    pub async fn set_images(&self, id: ProductId, images: &[String]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE candela.product SET images = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(images)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        notify(&mut *tx, Collection::Products).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Set the soft-delete flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    pub async fn set_active(&self, id: ProductId, active: bool) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE candela.product SET active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(active)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        notify(&mut *tx, Collection::Products).await?;
        tx.commit().await?;

        tracing::info!(product_id = %id, active, "Product active flag changed");
        Ok(())
    }
}
