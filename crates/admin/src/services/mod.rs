//! Business logic services for admin.
//!
//! # Services
//!
//! - `catalog` - Product save: document write, image uploads, image list patch
//! - `settings` - Store settings save with an optional logo upload

pub mod catalog;
pub mod settings;

pub use catalog::{
    ImageUpload, ProductWriter, SaveError, SaveOutcome, SaveTarget, check_images, save_product,
};
pub use settings::{SettingsError, merged_settings, upload_logo};
