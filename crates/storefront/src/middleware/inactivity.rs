//! Inactivity sign-out.
//!
//! The time of the last interaction is kept in the session next to the
//! current user. Every page request counts as a navigation; the pages also
//! report browser events to `POST /session/activity`. When the window has
//! elapsed the user is removed from the session and the visitor continues as
//! a guest.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tower_sessions::Session;

use candela_core::session::{AuthState, GuardDecision, InactivityGuard, Interaction};

use crate::middleware::auth::clear_current_user;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Guard state reported to the page script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityStatus {
    pub signed_in: bool,
    /// The user was signed out by this evaluation.
    pub expired: bool,
    pub remaining_secs: Option<i64>,
}

impl ActivityStatus {
    const GUEST: Self = Self {
        signed_in: false,
        expired: false,
        remaining_secs: None,
    };
}

/// Run the inactivity guard for this session at `now`.
///
/// Signs the user out if the window elapsed; otherwise records
/// `interaction` (if any) and persists the new last-activity time.
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
    let Some(user) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await?
    else {
        return Ok(ActivityStatus::GUEST);
    };

    let stored = session
        .get::<DateTime<Utc>>(session_keys::LAST_ACTIVITY)
        .await?;
    let mut guard = InactivityGuard::resume(timeout, stored.unwrap_or(now));

    if guard.check(now) == GuardDecision::ForceSignOut {
        clear_current_user(session).await?;
        guard.signed_out();
        tracing::info!(user_id = %user.id, "Signed out after inactivity");
        return Ok(ActivityStatus {
            expired: true,
            ..ActivityStatus::GUEST
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

/// Apply the inactivity guard to page requests.
///
/// Session failures are logged and the request proceeds.
pub async fn inactivity_middleware(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = evaluate_activity(
        &session,
        state.inactivity_timeout(),
        Some(Interaction::Navigation),
        Utc::now(),
    )
    .await
    {
        tracing::warn!(error = %e, "Inactivity check failed");
    }
    next.run(request).await
}
