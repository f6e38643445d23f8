//! Inactivity heartbeat.

use axum::{Form, Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;

use candela_core::session::Interaction;

use crate::error::{Result, clear_sentry_user};
use crate::middleware::{ActivityStatus, evaluate_activity};
use crate::state::AppState;

/// Heartbeat form: the browser event that triggered it.
#[derive(Debug, Deserialize)]
pub struct ActivityForm {
    pub kind: String,
}

/// POST /session/activity
///
/// Records the interaction and reports the guard state. Responds 401 when
/// this heartbeat signed the admin out; the page script then goes to the
/// login page.
pub async fn activity(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ActivityForm>,
) -> Result<(StatusCode, Json<ActivityStatus>)> {
    let interaction = form.kind.parse::<Interaction>().ok();
    let status = evaluate_activity(
        &session,
        state.inactivity_timeout(),
        interaction,
        Utc::now(),
    )
    .await?;

    if status.expired {
        clear_sentry_user();
        return Ok((StatusCode::UNAUTHORIZED, Json(status)));
    }
    Ok((StatusCode::OK, Json(status)))
}
