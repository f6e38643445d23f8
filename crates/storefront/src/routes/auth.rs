//! Authentication route handlers.
//!
//! Email and password sign-in and registration against the identity
//! service. Failed submissions re-render the form with the message and the
//! email retained; successful ones start the session and go home.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;

use candela_core::catalog::validate::validate_new_password;
use candela_data::db::User;
use candela_data::identity::{AuthError, IdentityService};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::routes::Layout;
use crate::state::AppState;

/// Shown when the identity service itself failed.
const UNAVAILABLE_MESSAGE: &str = "No pudimos completar la solicitud. Intenta de nuevo.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub error: Option<String>,
    pub email: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub error: Option<String>,
    pub email: String,
    pub display_name: String,
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

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user), Utc::now()).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Signed-in users go home.
pub async fn login_page(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        layout: Layout::new(&state, None),
        error: None,
        email: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match IdentityService::new(state.pool())
        .sign_in(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            start_session(&session, &user).await?;
            tracing::info!(user_id = %user.id, "User signed in");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            Ok(LoginTemplate {
                layout: Layout::new(&state, None),
                error: Some(auth_message(&e)),
                email: form.email,
            }
            .into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page. Signed-in users go home.
pub async fn register_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    RegisterTemplate {
        layout: Layout::new(&state, None),
        error: None,
        email: String::new(),
        display_name: String::new(),
    }
    .into_response()
}

/// Handle registration form submission.
///
/// New accounts are customers and are signed in right away.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let render_error = |message: String, form: RegisterForm| {
        RegisterTemplate {
            layout: Layout::new(&state, None),
            error: Some(message),
            email: form.email,
            display_name: form.display_name,
        }
        .into_response()
    };

    if let Err(e) = validate_new_password(&form.password, &form.password_confirm) {
        return Ok(render_error(e.to_string(), form));
    }

    match IdentityService::new(state.pool())
        .sign_up(&form.email, &form.password, &form.display_name)
        .await
    {
        Ok(user) => {
            start_session(&session, &user).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, code = e.code(), "Registration failed");
            Ok(render_error(auth_message(&e), form))
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
