//! Product save orchestration.
//!
//! A save is one document write followed by the image uploads, done one at a
//! time, and finally one patch of the image list. Uploads run after the write
//! because their paths need the product id. An upload failure never undoes
//! the write: the product keeps the images stored so far and the caller gets
//! [`SaveOutcome::PartiallySaved`].

use std::future::Future;

use thiserror::Error;

use candela_core::ProductId;
use candela_core::catalog::{ProductDraft, ValidationError};
use candela_data::RepositoryError;
use candela_data::db::ProductRepository;
use candela_data::storage::{MediaStore, StorageError, product_image_path, validate_image};

/// Shown when nothing could be saved.
pub const SAVE_FAILED_MESSAGE: &str = "Error al guardar, intenta de nuevo.";

/// The product writes a save needs.
pub trait ProductWriter: Send + Sync {
    fn create(
        &self,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<ProductId, RepositoryError>> + Send;

    fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn set_images(
        &self,
        id: ProductId,
        images: &[String],
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

impl ProductWriter for ProductRepository<'_> {
    async fn create(&self, draft: &ProductDraft) -> Result<ProductId, RepositoryError> {
        ProductRepository::create(self, draft).await
    }

    async fn update(&self, id: ProductId, draft: &ProductDraft) -> Result<(), RepositoryError> {
        ProductRepository::update(self, id, draft).await
    }

    async fn set_images(&self, id: ProductId, images: &[String]) -> Result<(), RepositoryError> {
        ProductRepository::set_images(self, id, images).await
    }
}

/// A file from the product form, not yet checked.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// An upload that passed [`validate_image`].
#[derive(Debug)]
pub struct CheckedImage {
    ext: &'static str,
    content_type: String,
    bytes: Vec<u8>,
}

/// Whether the save creates a product or overwrites one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    Create,
    Update(ProductId),
}

/// A save that wrote the product document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(ProductId),
    /// The product was written but `failed` new images are missing from it.
    PartiallySaved { id: ProductId, failed: usize },
}

impl SaveOutcome {
    #[must_use]
    pub const fn id(self) -> ProductId {
        match self {
            Self::Saved(id) | Self::PartiallySaved { id, .. } => id,
        }
    }

    /// Warning for the form, `None` when everything was stored.
    #[must_use]
    pub fn warning(self) -> Option<String> {
        match self {
            Self::Saved(_) => None,
            Self::PartiallySaved { failed, .. } => Some(format!(
                "Producto guardado, pero {failed} imagen(es) no pudieron subirse."
            )),
        }
    }
}

/// A save that wrote nothing.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("{}", image_message(.0))]
    Image(StorageError),

    #[error("Error al guardar, intenta de nuevo.")]
    Write(#[from] RepositoryError),
}

/// Spanish message for a rejected upload.
#[must_use]
pub fn image_message(err: &StorageError) -> &'static str {
    match err {
        StorageError::Empty => "La imagen está vacía.",
        StorageError::TooLarge { .. } => "Cada imagen debe pesar máximo 5 MB.",
        StorageError::UnsupportedType(_) => "Solo se permiten imágenes PNG, JPG, WEBP o GIF.",
        StorageError::InvalidPath(_) | StorageError::Io(_) => "No se pudo subir la imagen.",
    }
}

/// Check every upload before anything is written.
///
/// # Errors
///
/// [`SaveError::Image`] for the first rejected file.
pub fn check_images(uploads: Vec<ImageUpload>) -> Result<Vec<CheckedImage>, SaveError> {
    uploads
        .into_iter()
        .map(|upload| {
            let ext = validate_image(
                upload.file_name.as_deref(),
                upload.content_type.as_deref(),
                upload.bytes.len(),
            )
            .map_err(SaveError::Image)?;
            Ok(CheckedImage {
                ext,
                content_type: upload
                    .content_type
                    .unwrap_or_else(|| "application/octet-stream".to_owned()),
                bytes: upload.bytes,
            })
        })
        .collect()
}

/// Write the product, then upload `images` after the `kept` ones.
///
/// `millis` stamps the storage paths. Uploads stop at the first failure;
/// the ones already stored are still attached.
///
/// # Errors
///
/// [`SaveError::Write`] when the document write fails, or when only the
/// kept image list changed and patching it failed.
pub async fn save_product<W, M>(
    writer: &W,
    media: &M,
    target: SaveTarget,
    draft: &ProductDraft,
    kept: Vec<String>,
    images: Vec<CheckedImage>,
    millis: i64,
) -> Result<SaveOutcome, SaveError>
where
    W: ProductWriter,
    M: MediaStore,
{
    let id = match target {
        SaveTarget::Create => writer.create(draft).await?,
        SaveTarget::Update(id) => {
            writer.update(id, draft).await?;
            id
        }
    };

    let total = images.len();
    if total == 0 && target == SaveTarget::Create {
        return Ok(SaveOutcome::Saved(id));
    }

    let mut urls = kept;
    let mut failed = 0;
    for (offset, image) in images.into_iter().enumerate() {
        let path = product_image_path(id, urls.len(), millis, image.ext);
        match media.upload(&path, image.bytes, &image.content_type).await {
            Ok(url) => urls.push(url),
            Err(e) => {
                failed = total - offset;
                tracing::warn!(product_id = %id, path = %path, error = %e, failed, "Image upload failed");
                break;
            }
        }
    }

    if let Err(e) = writer.set_images(id, &urls).await {
        if total == 0 {
            return Err(e.into());
        }
        tracing::warn!(product_id = %id, error = %e, "Failed to attach uploaded images");
        return Ok(SaveOutcome::PartiallySaved { id, failed: total });
    }

    if failed > 0 {
        Ok(SaveOutcome::PartiallySaved { id, failed })
    } else {
        Ok(SaveOutcome::Saved(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use candela_core::Price;

    use super::*;

    #[derive(Default)]
    struct FakeWriter {
        fail_write: bool,
        fail_images: bool,
        images: Mutex<Vec<(ProductId, Vec<String>)>>,
    }

    impl ProductWriter for FakeWriter {
        async fn create(&self, _draft: &ProductDraft) -> Result<ProductId, RepositoryError> {
            if self.fail_write {
                return Err(RepositoryError::DataCorruption("down".to_string()));
            }
            Ok(ProductId::new(42))
        }

        async fn update(&self, _id: ProductId, _draft: &ProductDraft) -> Result<(), RepositoryError> {
            if self.fail_write {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        }

        async fn set_images(&self, id: ProductId, images: &[String]) -> Result<(), RepositoryError> {
            if self.fail_images {
                return Err(RepositoryError::DataCorruption("down".to_string()));
            }
            self.images.lock().unwrap().push((id, images.to_vec()));
            Ok(())
        }
    }

    /// Stores everything until `fail_from` uploads have succeeded.
    struct FakeMedia {
        fail_from: usize,
        paths: Mutex<Vec<String>>,
    }

    impl FakeMedia {
        fn failing_after(fail_from: usize) -> Self {
            Self {
                fail_from,
                paths: Mutex::new(Vec::new()),
            }
        }
    }

    impl MediaStore for FakeMedia {
        async fn upload(
            &self,
            path: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<String, StorageError> {
            let mut paths = self.paths.lock().unwrap();
            if paths.len() >= self.fail_from {
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }
            paths.push(path.to_owned());
            Ok(format!("/media/{path}"))
        }
    }

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Vela de coco".to_string(),
            description: String::new(),
            price: Price::from_pesos(35_000),
            stock: 4,
            category_id: None,
            category_name: String::new(),
            subcategory_id: None,
            subcategory_name: String::new(),
            aroma: Some("Coco".to_string()),
        }
    }

    fn uploads(count: usize) -> Vec<CheckedImage> {
        let files = (0..count)
            .map(|i| ImageUpload {
                file_name: Some(format!("foto{i}.jpg")),
                content_type: Some("image/jpeg".to_string()),
                bytes: vec![1, 2, 3],
            })
            .collect();
        check_images(files).unwrap()
    }

    #[tokio::test]
    async fn test_create_uploads_in_order() {
        let writer = FakeWriter::default();
        let media = FakeMedia::failing_after(usize::MAX);

        let outcome = save_product(&writer, &media, SaveTarget::Create, &draft(), Vec::new(), uploads(2), 7)
            .await
            .unwrap();

        assert_eq!(outcome, SaveOutcome::Saved(ProductId::new(42)));
        assert_eq!(outcome.warning(), None);
        let stored = writer.images.lock().unwrap();
        assert_eq!(
            stored.as_slice(),
            &[(
                ProductId::new(42),
                vec![
                    "/media/products/42/0-7.jpg".to_string(),
                    "/media/products/42/1-7.jpg".to_string(),
                ]
            )]
        );
    }

    #[tokio::test]
    async fn test_create_without_images_skips_patch() {
        let writer = FakeWriter::default();
        let media = FakeMedia::failing_after(0);

        let outcome = save_product(&writer, &media, SaveTarget::Create, &draft(), Vec::new(), Vec::new(), 7)
            .await
            .unwrap();

        assert_eq!(outcome, SaveOutcome::Saved(ProductId::new(42)));
        assert!(writer.images.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_product_and_stored_images() {
        let writer = FakeWriter::default();
        let media = FakeMedia::failing_after(1);

        let outcome = save_product(&writer, &media, SaveTarget::Create, &draft(), Vec::new(), uploads(3), 7)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::PartiallySaved {
                id: ProductId::new(42),
                failed: 2
            }
        );
        assert_eq!(
            outcome.warning().as_deref(),
            Some("Producto guardado, pero 2 imagen(es) no pudieron subirse.")
        );
        let stored = writer.images.lock().unwrap();
        assert_eq!(stored.first().map(|(_, urls)| urls.len()), Some(1));
    }

    #[tokio::test]
    async fn test_update_appends_after_kept_images() {
        let writer = FakeWriter::default();
        let media = FakeMedia::failing_after(usize::MAX);
        let kept = vec!["/media/products/9/0-1.jpg".to_string()];

        save_product(&writer, &media, SaveTarget::Update(ProductId::new(9)), &draft(), kept, uploads(1), 5)
            .await
            .unwrap();

        assert_eq!(
            media.paths.lock().unwrap().as_slice(),
            &["products/9/1-5.jpg".to_string()]
        );
        let stored = writer.images.lock().unwrap();
        assert_eq!(stored.first().map(|(_, urls)| urls.len()), Some(2));
    }

    #[tokio::test]
    async fn test_update_removing_images_patches_list() {
        let writer = FakeWriter::default();
        let media = FakeMedia::failing_after(0);

        save_product(&writer, &media, SaveTarget::Update(ProductId::new(9)), &draft(), Vec::new(), Vec::new(), 5)
            .await
            .unwrap();

        assert_eq!(
            writer.images.lock().unwrap().as_slice(),
            &[(ProductId::new(9), Vec::new())]
        );
    }

    #[tokio::test]
    async fn test_write_failure_uploads_nothing() {
        let writer = FakeWriter {
            fail_write: true,
            ..FakeWriter::default()
        };
        let media = FakeMedia::failing_after(usize::MAX);

        let err = save_product(&writer, &media, SaveTarget::Create, &draft(), Vec::new(), uploads(2), 7)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), SAVE_FAILED_MESSAGE);
        assert!(media.paths.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_patch_failure_counts_all_new_images() {
        let writer = FakeWriter {
            fail_images: true,
            ..FakeWriter::default()
        };
        let media = FakeMedia::failing_after(usize::MAX);

        let outcome = save_product(&writer, &media, SaveTarget::Create, &draft(), Vec::new(), uploads(2), 7)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::PartiallySaved {
                id: ProductId::new(42),
                failed: 2
            }
        );
    }

    #[test]
    fn test_check_images_rejects_before_write() {
        let files = vec![ImageUpload {
            file_name: Some("manual.pdf".to_string()),
            content_type: Some("application/pdf".to_string()),
            bytes: vec![1],
        }];
        let err = check_images(files).unwrap_err();
        assert_eq!(err.to_string(), "Solo se permiten imágenes PNG, JPG, WEBP o GIF.");
    }
}
