//! Authentication middleware and extractors for admin.
//!
//! Provides extractors for requiring admin authentication in route handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires an administrator session.
///
/// Without a session the browser is sent to the login page. A session whose
/// role cannot administer the store gets 403.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hola, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when the request has no usable admin session.
#[derive(Debug, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// Signed in without the admin role.
    Forbidden,
    /// Session layer missing.
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Tu cuenta no tiene permisos de administrador.",
            )
                .into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin = current_admin(session)
            .await
            .ok_or(AdminAuthRejection::RedirectToLogin)?;
        authorize(admin).map(Self)
    }
}

/// Extractor that optionally gets the current admin.
///
/// Unlike `RequireAdminAuth`, this does not reject the request if the admin is not logged in.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => current_admin(session).await,
            None => None,
        };

        Ok(Self(admin))
    }
}

async fn current_admin(session: &Session) -> Option<CurrentAdmin> {
    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
}

/// Only roles that can administer the store pass.
fn authorize(admin: CurrentAdmin) -> Result<CurrentAdmin, AdminAuthRejection> {
    if admin.role.can_administer() {
        Ok(admin)
    } else {
        tracing::warn!(user_id = %admin.id, "Non-admin session rejected");
        Err(AdminAuthRejection::Forbidden)
    }
}

/// Helper to set the current admin in the session and start the inactivity timer.
///
/// The session ID is cycled to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
    now: DateTime<Utc>,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await?;
    session.insert(session_keys::LAST_ACTIVITY, now).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    session
        .remove::<DateTime<Utc>>(session_keys::LAST_ACTIVITY)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use candela_core::{Email, UserId, UserRole};

    use super::*;

    fn admin(role: UserRole) -> CurrentAdmin {
        CurrentAdmin {
            id: UserId::new(1),
            email: Email::parse("admin@velas.co").unwrap(),
            name: "Admin".to_string(),
            role,
        }
    }

    #[test]
    fn test_authorize_admin() {
        assert!(authorize(admin(UserRole::Admin)).is_ok());
    }

    #[test]
    fn test_authorize_rejects_customer() {
        assert_eq!(
            authorize(admin(UserRole::Customer)).err(),
            Some(AdminAuthRejection::Forbidden)
        );
    }

    #[test]
    fn test_rejection_responses() {
        let redirect = AdminAuthRejection::RedirectToLogin.into_response();
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            redirect.headers().get("location").unwrap(),
            "/auth/login"
        );
        assert_eq!(
            AdminAuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
