//! Inactivity heartbeat.

use axum::{Form, Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;

use candela_core::session::Interaction;

use crate::error::Result;
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
/// this heartbeat found the session already expired, so the page can reload
/// as a guest. Unknown event kinds are treated as a plain check.
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

    let code = if status.expired {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    };
    Ok((code, Json(status)))
}
