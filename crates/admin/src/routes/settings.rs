//! Store settings route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Utc;
use tracing::instrument;

use candela_core::catalog::{SettingsInput, SocialLinks, StoreSettings};
use candela_data::Collection;
use candela_data::db::SettingsRepository;
use candela_data::storage::MAX_IMAGE_BYTES;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::routes::{Layout, Notice, NoticeQuery, refresh_after_write};
use crate::services::catalog::ImageUpload;
use crate::services::settings::{SettingsError, merged_settings, upload_logo};
use crate::state::AppState;

/// Room for one logo plus the text fields.
const SETTINGS_FORM_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(show).post(save))
        .layer(DefaultBodyLimit::max(SETTINGS_FORM_LIMIT))
}

/// Settings form as submitted.
#[derive(Debug, Default)]
pub struct SettingsForm {
    pub input: SettingsInput,
    pub logo: Option<ImageUpload>,
}

impl SettingsForm {
    /// Read the multipart body. An empty logo input means "keep the current one".
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a malformed body.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid form data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            if name == "logo" {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read logo: {e}")))?;
                if !(bytes.is_empty() && file_name.as_deref().is_none_or(str::is_empty)) {
                    form.logo = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid form field: {e}")))?;
            let input = &mut form.input;
            match name.as_str() {
                "store_name" => input.store_name = value,
                "description" => input.description = value,
                "contact_email" => input.contact_email = value,
                "phone" => input.phone = value,
                "instagram" => input.social.instagram = value,
                "facebook" => input.social.facebook = value,
                "whatsapp" => input.social.whatsapp = value,
                "tiktok" => input.social.tiktok = value,
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Form values for the template.
#[derive(Debug, Clone, Default)]
pub struct SettingsView {
    pub store_name: String,
    pub description: String,
    pub contact_email: String,
    pub phone: String,
    pub social: SocialLinks,
    pub logo_url: Option<String>,
}

impl SettingsView {
    fn from_input(input: &SettingsInput, logo_url: Option<String>) -> Self {
        Self {
            store_name: input.store_name.clone(),
            description: input.description.clone(),
            contact_email: input.contact_email.clone(),
            phone: input.phone.clone(),
            social: input.social.clone(),
            logo_url,
        }
    }
}

impl From<&StoreSettings> for SettingsView {
    fn from(settings: &StoreSettings) -> Self {
        Self {
            store_name: settings.store_name.clone(),
            description: settings.description.clone(),
            contact_email: settings.contact_email.clone(),
            phone: settings.phone.clone(),
            social: settings.social.clone(),
            logo_url: settings.logo_url.clone(),
        }
    }
}

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub layout: Layout,
    pub notice: Option<Notice>,
    pub settings: SettingsView,
}

fn render(
    state: &AppState,
    admin: CurrentAdmin,
    notice: Option<Notice>,
    settings: SettingsView,
) -> Response {
    SettingsTemplate {
        layout: Layout::new(state, Some(admin), "/settings"),
        notice,
        settings,
    }
    .into_response()
}

/// Display the settings form.
///
/// GET /settings
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<NoticeQuery>,
) -> Response {
    let settings = SettingsView::from(&*state.catalog().settings.data());
    render(&state, admin, query.notice(), settings)
}

/// Save the settings.
///
/// POST /settings
#[instrument(skip_all)]
pub async fn save(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    multipart: Multipart,
) -> Result<Response> {
    let form = SettingsForm::read(multipart).await?;
    let current = state.catalog().settings.data();

    let input = match form.input.validate() {
        Ok(input) => input,
        Err(e) => {
            let view = SettingsView::from_input(&form.input, current.logo_url.clone());
            return Ok(render(&state, admin, Some(Notice::error(e.to_string())), view));
        }
    };

    let result = async {
        let new_logo = match form.logo {
            Some(upload) => {
                Some(upload_logo(state.media(), upload, Utc::now().timestamp_millis()).await?)
            }
            None => None,
        };
        let settings = merged_settings(&current, input.clone(), new_logo);
        SettingsRepository::new(state.pool()).save(&settings).await?;
        Ok::<_, SettingsError>(settings)
    }
    .await;

    match result {
        Ok(settings) => {
            tracing::info!(
                admin_id = %admin.id,
                logo = settings.logo_url.is_some(),
                "Store settings saved"
            );
            refresh_after_write(&state, &[Collection::Settings]).await;
            Ok(Redirect::to("/settings?notice=settings_saved").into_response())
        }
        Err(e) => {
            if let SettingsError::Write(err) = &e {
                tracing::error!(error = %err, "Settings write failed");
            }
            let view = SettingsView::from_input(&input, current.logo_url.clone());
            Ok(render(&state, admin, Some(Notice::error(e.to_string())), view))
        }
    }
}
