//! Inactivity sign-out for the admin panel.
//!
//! Same guard as the storefront, with a harder ending: an expired admin is
//! signed out and sent back to the login page with a notice.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tower_sessions::Session;

use candela_core::session::{AuthState, GuardDecision, InactivityGuard, Interaction};

use crate::middleware::auth::clear_current_admin;
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Login page shown after an inactivity sign-out.
pub const EXPIRED_LOGIN_PATH: &str = "/auth/login?expired=1";

/// Guard state reported to the page script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityStatus {
    pub signed_in: bool,
    /// The admin was signed out by this evaluation.
    pub expired: bool,
    pub remaining_secs: Option<i64>,
}

impl ActivityStatus {
    const SIGNED_OUT: Self = Self {
        signed_in: false,
        expired: false,
        remaining_secs: None,
    };
}

/// Run the inactivity guard for this session at `now`.
///
/// # Errors
///
/// Returns an error if the session store cannot be read or written.
pub async fn evaluate_activity(
    session: &Session,
    timeout: TimeDelta,
    interaction: Option<Interaction>,
    now: DateTime<Utc>,
) -> Result<ActivityStatus, tower_sessions::session::Error> {
    let Some(admin) = session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?
    else {
        return Ok(ActivityStatus::SIGNED_OUT);
    };

    let stored = session
        .get::<DateTime<Utc>>(session_keys::LAST_ACTIVITY)
        .await?;
    let mut guard = InactivityGuard::resume(timeout, stored.unwrap_or(now));

    if guard.check(now) == GuardDecision::ForceSignOut {
        clear_current_admin(session).await?;
        guard.signed_out();
        tracing::info!(user_id = %admin.id, "Admin signed out after inactivity");
        return Ok(ActivityStatus {
            expired: true,
            ..ActivityStatus::SIGNED_OUT
        });
    }

    if let Some(interaction) = interaction {
        guard.record(interaction, now);
    }
    if let AuthState::SignedIn { last_activity } = guard.state()
        && stored != Some(last_activity)
    {
        session
            .insert(session_keys::LAST_ACTIVITY, last_activity)
            .await?;
    }

    Ok(ActivityStatus {
        signed_in: true,
        expired: false,
        remaining_secs: guard.remaining(now).map(|r| r.num_seconds()),
    })
}

/// Apply the inactivity guard to panel pages.
///
/// Expired sessions are redirected to the login page. Session failures are
/// logged and the request proceeds to the auth extractor.
pub async fn inactivity_middleware(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    match evaluate_activity(
        &session,
        state.inactivity_timeout(),
        Some(Interaction::Navigation),
        Utc::now(),
    )
    .await
    {
        Ok(status) if status.expired => Redirect::to(EXPIRED_LOGIN_PATH).into_response(),
        Ok(_) => next.run(request).await,
        Err(e) => {
            tracing::warn!(error = %e, "Inactivity check failed");
            next.run(request).await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use candela_core::{Email, UserId, UserRole};
    use chrono::TimeZone;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::middleware::auth::set_current_admin;

    const FIVE_MINUTES: TimeDelta = TimeDelta::minutes(5);

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_750_000_000 + secs, 0).unwrap()
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn admin() -> CurrentAdmin {
        CurrentAdmin {
            id: UserId::new(1),
            email: Email::parse("admin@velas.co").unwrap(),
            name: "Admin".to_string(),
            role: UserRole::Admin,
        }
    }

    #[tokio::test]
    async fn test_navigation_keeps_admin_signed_in() {
        let session = session();
        set_current_admin(&session, &admin(), at(0)).await.unwrap();

        let status = evaluate_activity(
            &session,
            FIVE_MINUTES,
            Some(Interaction::Navigation),
            at(299),
        )
        .await
        .unwrap();
        assert!(status.signed_in);
        assert_eq!(status.remaining_secs, Some(300));
    }

    #[tokio::test]
    async fn test_idle_admin_is_signed_out() {
        let session = session();
        set_current_admin(&session, &admin(), at(0)).await.unwrap();

        let status = evaluate_activity(&session, FIVE_MINUTES, None, at(300))
            .await
            .unwrap();
        assert!(status.expired);
        assert!(
            session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_flushed_heartbeat_extends_window() {
        let session = session();
        set_current_admin(&session, &admin(), at(0)).await.unwrap();

        // A keypress throttled at 5s is flushed once the 30s window closes.
        let flushed = "keydown".parse::<Interaction>().ok();
        evaluate_activity(&session, FIVE_MINUTES, flushed, at(30))
            .await
            .unwrap();

        // The page's expiry check after five minutes finds the later activity.
        let check = "check".parse::<Interaction>().ok();
        assert_eq!(check, None);
        let status = evaluate_activity(&session, FIVE_MINUTES, check, at(301))
            .await
            .unwrap();
        assert!(status.signed_in);
        assert_eq!(status.remaining_secs, Some(29));
    }

    #[tokio::test]
    async fn test_no_admin_is_not_expired() {
        let status = evaluate_activity(&session(), FIVE_MINUTES, None, at(0))
            .await
            .unwrap();
        assert_eq!(status, ActivityStatus::SIGNED_OUT);
    }
}
