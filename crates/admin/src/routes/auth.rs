//! Admin authentication route handlers.
//!
//! Only accounts whose role can administer the store may sign in here.
//! Anyone else gets the same form back with a message and no session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;

use candela_data::identity::{AuthError, IdentityService};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::routes::{Layout, Notice};
use crate::state::AppState;

/// Shown when a valid account lacks the admin role.
pub const NOT_ADMIN_MESSAGE: &str = "Tu cuenta no tiene permisos de administrador.";

/// Shown when the identity service itself failed.
const UNAVAILABLE_MESSAGE: &str = "No pudimos completar la solicitud. Intenta de nuevo.";

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Set after an inactivity sign-out.
    pub expired: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub notice: Option<Notice>,
    pub email: String,
}

impl LoginTemplate {
    fn new(state: &AppState, notice: Option<Notice>, email: String) -> Self {
        Self {
            layout: Layout::new(state, None, "/auth/login"),
            notice,
            email,
        }
    }
}

/// User-facing message for an identity failure. Internal failures are logged.
fn auth_message(err: &AuthError) -> String {
    match err {
        AuthError::Repository(_) | AuthError::PasswordHash => {
            tracing::error!(error = %err, "Identity service failed");
            UNAVAILABLE_MESSAGE.to_string()
        }
        _ => err.to_string(),
    }
}

/// Display the login page. Signed-in admins go to the dashboard.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    let notice = query
        .expired
        .is_some()
        .then(|| Notice::warning("Tu sesión se cerró por inactividad. Ingresa de nuevo."));
    LoginTemplate::new(&state, notice, String::new()).into_response()
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let user = match IdentityService::new(state.pool())
        .sign_in(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, code = e.code(), "Admin login failed");
            let notice = Notice::error(auth_message(&e));
            return Ok(LoginTemplate::new(&state, Some(notice), form.email).into_response());
        }
    };

    if !user.role.can_administer() {
        tracing::warn!(user_id = %user.id, role = ?user.role, "Non-admin login refused");
        let notice = Notice::error(NOT_ADMIN_MESSAGE);
        return Ok(LoginTemplate::new(&state, Some(notice), form.email).into_response());
    }

    set_current_admin(&session, &CurrentAdmin::from(&user), Utc::now()).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "Admin signed in");
    Ok(Redirect::to("/").into_response())
}

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/auth/login"))
}
