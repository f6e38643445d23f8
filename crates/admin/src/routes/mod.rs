//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Dashboard
//! GET  /                                   - Counters and stock breakdown
//!
//! # Products
//! GET  /products                           - Product listing (?page=)
//! GET  /products/new                       - New product form
//! POST /products                           - Create (multipart, up to 5 images)
//! GET  /products/{id}/edit                 - Edit form
//! POST /products/{id}                      - Update (multipart)
//! POST /products/{id}/toggle               - Activate / deactivate
//!
//! # Categories
//! GET  /categories                         - Categories with their subcategories
//! POST /categories                         - Create category
//! POST /categories/{id}                    - Edit (rename cascades)
//! POST /categories/{id}/toggle             - Activate / deactivate (cascade warning)
//! POST /categories/{id}/delete             - Soft delete, blocked by active dependents
//! POST /categories/{id}/subcategories      - Create subcategory
//! POST /subcategories/{id}                 - Edit (rename cascades)
//! POST /subcategories/{id}/toggle          - Activate / deactivate
//! POST /subcategories/{id}/delete          - Soft delete, blocked by active products
//!
//! # Settings
//! GET  /settings                           - Store settings form
//! POST /settings                           - Save (multipart, optional logo)
//!
//! # Auth
//! GET  /auth/login                         - Login page
//! POST /auth/login                         - Login action
//! POST /auth/logout                        - Logout
//! POST /session/activity                   - Inactivity heartbeat
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod products;
pub mod session;
pub mod settings;
pub mod subcategories;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use serde::Deserialize;

use candela_core::session::BROWSER_ACTIVITY_EVENTS;
use candela_data::Collection;

use crate::middleware::{auth_rate_limiter, inactivity_middleware};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Shown when a catalog write fails for any reason other than a duplicate name.
pub const SAVE_FAILED_MESSAGE: &str = "Error al guardar, intenta de nuevo.";

/// Data every panel page needs: navigation, the signed-in admin and the
/// activity script settings.
pub struct Layout {
    pub admin: Option<CurrentAdmin>,
    pub store_name: String,
    pub current_path: &'static str,
    pub inactivity_secs: i64,
}

impl Layout {
    #[must_use]
    pub fn new(state: &AppState, admin: Option<CurrentAdmin>, current_path: &'static str) -> Self {
        Self {
            admin,
            store_name: state.catalog().settings.data().display_name().to_owned(),
            current_path,
            inactivity_secs: state.inactivity_timeout().num_seconds(),
        }
    }

    /// Space-separated event names the activity script listens to.
    #[must_use]
    pub fn activity_events(&self) -> String {
        BROWSER_ACTIVITY_EVENTS.join(" ")
    }

    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.admin.is_some()
    }

    /// Whether the navigation entry for `path` is the current section.
    #[must_use]
    pub fn is_current(&self, path: &str) -> bool {
        if path == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(path)
        }
    }
}

/// A message shown at the top of a page after a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// CSS modifier: `success`, `warning` or `error`.
    pub kind: &'static str,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: "success",
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: "warning",
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: "error",
            message: message.into(),
        }
    }

    /// Map a `?notice=` code to its message. Unknown codes are ignored.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let notice = match code {
            "product_created" => Self::success("Producto creado."),
            "product_updated" => Self::success("Producto actualizado."),
            "product_activated" => Self::success("Producto activado."),
            "product_deactivated" => Self::success("Producto desactivado."),
            "category_created" => Self::success("Categoría creada."),
            "category_updated" => Self::success("Categoría actualizada."),
            "category_activated" => Self::success("Categoría activada."),
            "category_deactivated" => Self::success("Categoría desactivada."),
            "category_deleted" => Self::success("Categoría eliminada."),
            "subcategory_created" => Self::success("Subcategoría creada."),
            "subcategory_updated" => Self::success("Subcategoría actualizada."),
            "subcategory_activated" => Self::success("Subcategoría activada."),
            "subcategory_deactivated" => Self::success("Subcategoría desactivada."),
            "subcategory_deleted" => Self::success("Subcategoría eliminada."),
            "settings_saved" => Self::success("Configuración guardada."),
            "save_failed" => Self::error(SAVE_FAILED_MESSAGE),
            _ => return None,
        };
        Some(notice)
    }
}

/// `?notice=` query parameter shared by the list pages.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.notice.as_deref().and_then(Notice::from_code)
    }
}

/// Pick up a write right away instead of waiting for the change notice.
///
/// A failed refetch only delays the page; the notice will still arrive.
pub async fn refresh_after_write(state: &AppState, collections: &[Collection]) {
    for &collection in collections {
        if let Err(e) = state.catalog().refresh(collection).await {
            tracing::warn!(%collection, error = %e, "Snapshot refresh failed");
        }
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let rate_limited = Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .layer(auth_rate_limiter());

    rate_limited.route("/logout", post(auth::logout))
}

/// Create all routes for the admin panel.
pub fn routes(state: &AppState) -> Router<AppState> {
    let panel = Router::new()
        .route("/", get(dashboard::index))
        .merge(products::router())
        .merge(categories::router())
        .merge(subcategories::router())
        .merge(settings::router())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            inactivity_middleware,
        ));

    Router::new()
        .merge(panel)
        .nest("/auth", auth_routes())
        .route("/session/activity", post(session::activity))
}
