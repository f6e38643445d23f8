//! Object storage for product images and the store logo.
//!
//! Uploads are addressed by a relative path and return the public URL the
//! pages should render. Paths are namespaced by entity and stamped with a
//! millisecond timestamp so re-uploads never collide with cached copies:
//!
//! - `products/{id}/{index}-{millis}.{ext}`
//! - `logos/store-logo-{millis}.{ext}`

use std::future::Future;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use candela_core::ProductId;

/// Maximum accepted upload size (5 MB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image extensions.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

/// Errors that can occur while storing media.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file is empty")]
    Empty,

    #[error("file too large: {size} bytes (max 5 MB)")]
    TooLarge { size: usize },

    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Somewhere uploaded files can be written and served from.
pub trait MediaStore: Send + Sync {
    /// Store `bytes` at `path` and return its public URL.
    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<String, StorageError>> + Send;
}

/// Check size and type of an uploaded image and pick its extension.
///
/// The extension comes from the file name when it has an accepted one,
/// otherwise from the declared content type.
///
/// # Errors
///
/// Returns [`StorageError`] for empty, oversized or non-image uploads.
pub fn validate_image(
    file_name: Option<&str>,
    content_type: Option<&str>,
    size: usize,
) -> Result<&'static str, StorageError> {
    if size == 0 {
        return Err(StorageError::Empty);
    }
    if size > MAX_IMAGE_BYTES {
        return Err(StorageError::TooLarge { size });
    }

    let from_name = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .and_then(|ext| ALLOWED_EXTENSIONS.iter().copied().find(|a| *a == ext));
    let from_type = content_type.and_then(|ct| match ct {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    });

    from_name.or(from_type).ok_or_else(|| {
        StorageError::UnsupportedType(
            content_type
                .or(file_name)
                .unwrap_or("unknown")
                .to_owned(),
        )
    })
}

/// Storage path of the `index`-th image of a product.
#[must_use]
pub fn product_image_path(product: ProductId, index: usize, millis: i64, ext: &str) -> String {
    format!("products/{product}/{index}-{millis}.{ext}")
}

/// Storage path of a store logo.
#[must_use]
pub fn logo_path(millis: i64, ext: &str) -> String {
    format!("logos/store-logo-{millis}.{ext}")
}

/// Stores files in a local directory served over HTTP at `public_base`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_base: String,
}

impl LocalMediaStore {
    /// `root` is the directory on disk; `public_base` the URL prefix it is served at.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_owned(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidPath(path.to_owned()));
        }
        Ok(self.root.join(relative))
    }
}

impl MediaStore for LocalMediaStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = bytes.len();
        tokio::fs::write(&target, bytes).await?;

        tracing::info!(path, size, content_type, "Media stored");
        Ok(format!("{}/{path}", self.public_base))
    }
}
