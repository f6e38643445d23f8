//! Store settings save: form check, optional logo upload, document merge.
//!
//! The logo is uploaded before the document is written so the saved
//! settings never point at a file that does not exist. A failed upload
//! writes nothing.

use thiserror::Error;

use candela_core::catalog::{SettingsInput, StoreSettings, ValidationError};
use candela_data::RepositoryError;
use candela_data::storage::{MediaStore, StorageError, logo_path, validate_image};

use crate::services::catalog::{ImageUpload, image_message};

/// A settings save that wrote nothing.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("{}", image_message(.0))]
    Logo(StorageError),

    #[error("Error al guardar, intenta de nuevo.")]
    Write(#[from] RepositoryError),
}

/// Check and store a new logo, returning its public URL.
///
/// # Errors
///
/// [`SettingsError::Logo`] if the file is rejected or cannot be stored.
pub async fn upload_logo<M: MediaStore>(
    media: &M,
    upload: ImageUpload,
    millis: i64,
) -> Result<String, SettingsError> {
    let ext = validate_image(
        upload.file_name.as_deref(),
        upload.content_type.as_deref(),
        upload.bytes.len(),
    )
    .map_err(SettingsError::Logo)?;
    let content_type = upload
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_owned());

    let path = logo_path(millis, ext);
    media
        .upload(&path, upload.bytes, &content_type)
        .await
        .map_err(|e| {
            tracing::warn!(path = %path, error = %e, "Logo upload failed");
            SettingsError::Logo(e)
        })
}

/// The document to store: the checked form over the current settings,
/// keeping the current logo unless a new one was uploaded.
#[must_use]
pub fn merged_settings(
    current: &StoreSettings,
    input: SettingsInput,
    new_logo: Option<String>,
) -> StoreSettings {
    StoreSettings {
        store_name: input.store_name,
        logo_url: new_logo.or_else(|| current.logo_url.clone()),
        description: input.description,
        contact_email: input.contact_email,
        phone: input.phone,
        social: input.social,
        updated_at: current.updated_at,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use candela_core::catalog::SocialLinks;

    use super::*;

    #[derive(Default)]
    struct RecordingMedia {
        fail: bool,
        paths: Mutex<Vec<String>>,
    }

    impl MediaStore for RecordingMedia {
        async fn upload(
            &self,
            path: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<String, StorageError> {
            if self.fail {
                return Err(StorageError::Io(std::io::Error::other("read-only")));
            }
            self.paths.lock().unwrap().push(path.to_owned());
            Ok(format!("/media/{path}"))
        }
    }

    fn logo(name: &str, content_type: &str, size: usize) -> ImageUpload {
        ImageUpload {
            file_name: Some(name.to_string()),
            content_type: Some(content_type.to_string()),
            bytes: vec![0; size],
        }
    }

    #[tokio::test]
    async fn test_upload_logo_path() {
        let media = RecordingMedia::default();
        let url = upload_logo(&media, logo("Logo.PNG", "image/png", 10), 1_700)
            .await
            .unwrap();
        assert_eq!(url, "/media/logos/store-logo-1700.png");
        assert_eq!(media.paths.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_logo_rejects_non_images() {
        let media = RecordingMedia::default();
        let err = upload_logo(&media, logo("notas.txt", "text/plain", 10), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::Logo(StorageError::UnsupportedType(_))));
        assert_eq!(err.to_string(), "Solo se permiten imágenes PNG, JPG, WEBP o GIF.");
        assert!(media.paths.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_logo_store_failure() {
        let media = RecordingMedia {
            fail: true,
            ..RecordingMedia::default()
        };
        let err = upload_logo(&media, logo("logo.jpg", "image/jpeg", 10), 1)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No se pudo subir la imagen.");
    }

    #[test]
    fn test_merged_settings_keeps_logo() {
        let current = StoreSettings {
            logo_url: Some("/media/logos/old.png".to_string()),
            ..StoreSettings::default()
        };
        let input = SettingsInput {
            store_name: "Candela Luz".to_string(),
            description: "Velas artesanales".to_string(),
            contact_email: "hola@candela.co".to_string(),
            phone: "3001234567".to_string(),
            social: SocialLinks {
                instagram: "@candela".to_string(),
                ..SocialLinks::default()
            },
        };

        let kept = merged_settings(&current, input.clone(), None);
        assert_eq!(kept.logo_url.as_deref(), Some("/media/logos/old.png"));
        assert_eq!(kept.store_name, "Candela Luz");
        assert_eq!(kept.social.instagram, "@candela");

        let replaced = merged_settings(&current, input, Some("/media/logos/new.png".to_string()));
        assert_eq!(replaced.logo_url.as_deref(), Some("/media/logos/new.png"));
    }
}
