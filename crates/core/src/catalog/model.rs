//! Catalog entities as held in memory.
//!
//! These mirror the rows of the `candela` schema. Products and subcategories
//! carry denormalized copies of their parents' names so list pages never need
//! a join; the rename cascades keep them in sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, Price, ProductId, SubcategoryId};

/// Maximum number of images per product. The first image is the primary one.
pub const MAX_PRODUCT_IMAGES: usize = 5;

/// A candle (or accessory) for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub category_id: Option<CategoryId>,
    /// Denormalized category name, empty when uncategorized.
    pub category_name: String,
    pub subcategory_id: Option<SubcategoryId>,
    /// Denormalized subcategory name, empty when not set.
    pub subcategory_name: String,
    /// Ordered image URLs, at most [`MAX_PRODUCT_IMAGES`].
    pub images: Vec<String>,
    pub aroma: Option<String>,
    /// Soft-delete marker. Inactive products stay in the database but are
    /// hidden from the public catalog.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The image shown on cards and as the first gallery slide.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Whether the product may appear on public pages at all.
    ///
    /// This only checks the product's own flag; orphan checks against the
    /// active category lists live in [`crate::catalog::filter`].
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.active
    }

    /// Out of stock means exactly zero units.
    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        self.stock <= 0
    }
}

/// Top-level grouping of products (e.g. "Velas aromáticas").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Second-level grouping that always belongs to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    /// Denormalized parent category name.
    pub category_name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Social network handles shown in the footer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub instagram: String,
    pub facebook: String,
    pub whatsapp: String,
    pub tiktok: String,
}

impl SocialLinks {
    /// Whether at least one link is filled in.
    #[must_use]
    pub const fn any(&self) -> bool {
        !self.instagram.is_empty()
            || !self.facebook.is_empty()
            || !self.whatsapp.is_empty()
            || !self.tiktok.is_empty()
    }
}

/// The singleton store settings document (`settings/general`).
///
/// Stored as JSON; every field defaults so a partially written or missing
/// document still deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub store_name: String,
    pub logo_url: Option<String>,
    pub description: String,
    pub contact_email: String,
    pub phone: String,
    pub social: SocialLinks,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoreSettings {
    /// Name used in the header when no settings have been saved yet.
    pub const DEFAULT_STORE_NAME: &'static str = "Candela";

    /// The store name to render, falling back to the default brand.
    #[must_use]
    pub fn display_name(&self) -> &str {
        let name = self.store_name.trim();
        if name.is_empty() {
            Self::DEFAULT_STORE_NAME
        } else {
            name
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: Self::DEFAULT_STORE_NAME.to_owned(),
            logo_url: None,
            description: String::new(),
            contact_email: String::new(),
            phone: String::new(),
            social: SocialLinks::default(),
            updated_at: None,
        }
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::fixtures::product;
    use super::*;

    #[test]
    fn test_primary_image_is_first() {
        let mut p = product(1, 3, None, None);
        assert_eq!(p.primary_image(), None);
        p.images = vec!["a.png".to_owned(), "b.png".to_owned()];
        assert_eq!(p.primary_image(), Some("a.png"));
    }

    #[test]
    fn test_out_of_stock_is_zero() {
        assert!(product(1, 0, None, None).is_out_of_stock());
        assert!(!product(1, 1, None, None).is_out_of_stock());
    }

    #[test]
    fn test_settings_deserialize_partial_document() {
        let settings: StoreSettings =
            serde_json::from_str(r#"{"store_name":"Luz de Luna","social":{"instagram":"@luz"}}"#)
                .unwrap();
        assert_eq!(settings.display_name(), "Luz de Luna");
        assert_eq!(settings.social.instagram, "@luz");
        assert!(settings.social.any());
        assert!(settings.logo_url.is_none());
    }

    #[test]
    fn test_settings_blank_name_falls_back() {
        let settings = StoreSettings {
            store_name: "   ".to_owned(),
            ..StoreSettings::default()
        };
        assert_eq!(settings.display_name(), StoreSettings::DEFAULT_STORE_NAME);
    }
}
