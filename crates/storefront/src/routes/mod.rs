//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /catalog                - Catalog (?category=&subcategory=)
//! GET  /products/{id}          - Product detail
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Live updates
//! GET  /events/catalog         - Server-sent "refresh" events
//! POST /session/activity       - Inactivity heartbeat
//! ```

pub mod auth;
pub mod catalog;
pub mod events;
pub mod home;
pub mod products;
pub mod session;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use candela_core::catalog::StoreSettings;
use candela_core::session::BROWSER_ACTIVITY_EVENTS;

use crate::middleware::{auth_rate_limiter, inactivity_middleware};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Data every page layout needs: header, footer and the activity script.
pub struct Layout {
    pub settings: Arc<StoreSettings>,
    pub user: Option<CurrentUser>,
    pub inactivity_secs: i64,
}

impl Layout {
    #[must_use]
    pub fn new(state: &AppState, user: Option<CurrentUser>) -> Self {
        Self {
            settings: state.catalog().settings.data(),
            user,
            inactivity_secs: state.inactivity_timeout().num_seconds(),
        }
    }

    #[must_use]
    pub fn store_name(&self) -> &str {
        self.settings.display_name()
    }

    /// Space-separated event names the activity script listens to.
    #[must_use]
    pub fn activity_events(&self) -> String {
        BROWSER_ACTIVITY_EVENTS.join(" ")
    }

    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.user.is_some()
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let rate_limited = Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .layer(auth_rate_limiter());

    rate_limited.route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes(state: &AppState) -> Router<AppState> {
    let pages = Router::new()
        .route("/", get(home::home))
        .route("/catalog", get(catalog::index))
        .route("/products/{id}", get(products::show))
        .nest("/auth", auth_routes())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            inactivity_middleware,
        ));

    Router::new()
        .merge(pages)
        .route("/events/catalog", get(events::catalog))
        .route("/session/activity", post(session::activity))
}
