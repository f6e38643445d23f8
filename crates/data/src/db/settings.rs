//! Store settings storage.
//!
//! Settings are a singleton JSONB document under the key `general`. Saving
//! merges the new top-level fields into the stored document, so a partial
//! save (e.g. only the logo) keeps everything else.

use serde_json::Value as JsonValue;
use sqlx::PgPool;

use candela_core::catalog::StoreSettings;

use super::{RepositoryError, notify};
use crate::live::Collection;

/// Key of the store settings document.
pub const GENERAL_KEY: &str = "general";

/// Repository for the settings documents.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the store settings, `None` if they were never saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the document is not an object.
    pub async fn get(&self) -> Result<Option<StoreSettings>, RepositoryError> {
        let value: Option<JsonValue> =
            sqlx::query_scalar("SELECT value FROM candela.settings WHERE key = $1")
                .bind(GENERAL_KEY)
                .fetch_optional(self.pool)
                .await?;

        value
            .map(|v| {
                serde_json::from_value(v).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid settings document: {e}"))
                })
            })
            .transpose()
    }

    /// Merge `settings` into the stored document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn save(&self, settings: &StoreSettings) -> Result<(), RepositoryError> {
        let value = serde_json::to_value(settings)
            .map_err(|e| RepositoryError::DataCorruption(format!("unserializable settings: {e}")))?;
        self.merge(value).await
    }

    /// Merge a partial document (top-level keys) into the stored settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn merge(&self, patch: JsonValue) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO candela.settings (key, value)
            VALUES ($1, $2 || jsonb_build_object('updated_at', NOW()))
            ON CONFLICT (key) DO UPDATE
            SET value = candela.settings.value || EXCLUDED.value, updated_at = NOW()
            ",
        )
        .bind(GENERAL_KEY)
        .bind(patch)
        .execute(&mut *tx)
        .await?;

        notify(&mut *tx, Collection::Settings).await?;
        tx.commit().await?;

        tracing::info!("Store settings saved");
        Ok(())
    }
}
