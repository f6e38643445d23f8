//! Inactivity guard for signed-in sessions.
//!
//! A signed-in user is signed out after a period without interaction
//! (5 minutes by default). The guard is a small state machine with an injected
//! clock: callers pass `now` into every operation, record interactions as they
//! observe them, and act on [`GuardDecision::ForceSignOut`] by ending the
//! session. Signing out is then observed as the transition back to
//! [`AuthState::SignedOut`].
//!
//! This is a convenience for shared devices, not a security boundary; the
//! server-side session expiry still applies independently.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Default inactivity window.
pub const DEFAULT_INACTIVITY_TIMEOUT: TimeDelta = TimeDelta::minutes(5);

/// Browser event names the pages listen to and report back.
pub const BROWSER_ACTIVITY_EVENTS: [&str; 6] = [
    "mousemove",
    "mousedown",
    "keydown",
    "scroll",
    "touchstart",
    "click",
];

/// A user interaction that resets the inactivity timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    MouseMove,
    MouseDown,
    KeyDown,
    Scroll,
    TouchStart,
    Click,
    /// A page request seen by the server.
    Navigation,
}

impl std::str::FromStr for Interaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mousemove" => Ok(Self::MouseMove),
            "mousedown" => Ok(Self::MouseDown),
            "keydown" => Ok(Self::KeyDown),
            "scroll" => Ok(Self::Scroll),
            "touchstart" => Ok(Self::TouchStart),
            "click" => Ok(Self::Click),
            "navigation" => Ok(Self::Navigation),
            _ => Err(format!("unknown interaction: {s}")),
        }
    }
}

/// Authentication state as seen by the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Sign-in state not yet known.
    Loading,
    SignedOut,
    SignedIn { last_activity: DateTime<Utc> },
}

/// What the caller should do after a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Nothing to do (signed in and within the window, or not signed in).
    Continue,
    /// The window elapsed; the caller must sign the user out.
    ForceSignOut,
}

/// Inactivity timer over an [`AuthState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactivityGuard {
    timeout: TimeDelta,
    state: AuthState,
}

impl InactivityGuard {
    /// A guard that does not yet know whether anyone is signed in.
    #[must_use]
    pub const fn new(timeout: TimeDelta) -> Self {
        Self {
            timeout,
            state: AuthState::Loading,
        }
    }

    /// A guard for a session already signed in, last active at `last_activity`.
    #[must_use]
    pub const fn resume(timeout: TimeDelta, last_activity: DateTime<Utc>) -> Self {
        Self {
            timeout,
            state: AuthState::SignedIn { last_activity },
        }
    }

    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    #[must_use]
    pub const fn timeout(&self) -> TimeDelta {
        self.timeout
    }

    /// Enter the signed-in state, starting the timer at `now`.
    ///
    /// Re-entering while already signed in restarts the timer.
    pub const fn signed_in(&mut self, now: DateTime<Utc>) {
        self.state = AuthState::SignedIn { last_activity: now };
    }

    /// Enter the signed-out state. The timer is discarded.
    pub const fn signed_out(&mut self) {
        self.state = AuthState::SignedOut;
    }

    /// Record an interaction. Ignored unless signed in.
    ///
    /// An interaction that arrives after the window has already elapsed does
    /// not revive the session; [`Self::check`] still reports the expiry.
    pub fn record(&mut self, _interaction: Interaction, now: DateTime<Utc>) {
        if let AuthState::SignedIn { last_activity } = self.state
            && now - last_activity < self.timeout
            && now > last_activity
        {
            self.state = AuthState::SignedIn { last_activity: now };
        }
    }

    /// Check the timer at `now`.
    #[must_use]
    pub fn check(&self, now: DateTime<Utc>) -> GuardDecision {
        match self.state {
            AuthState::SignedIn { last_activity } if now - last_activity >= self.timeout => {
                GuardDecision::ForceSignOut
            }
            _ => GuardDecision::Continue,
        }
    }

    /// When the session will expire if nothing else happens.
    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self.state {
            AuthState::SignedIn { last_activity } => Some(last_activity + self.timeout),
            AuthState::Loading | AuthState::SignedOut => None,
        }
    }

    /// Time left before expiry, zero once elapsed.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.deadline()
            .map(|deadline| (deadline - now).max(TimeDelta::zero()))
    }
}

impl Default for InactivityGuard {
    fn default() -> Self {
        Self::new(DEFAULT_INACTIVITY_TIMEOUT)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).single().unwrap()
    }

    #[test]
    fn test_starts_loading_and_never_expires_signed_out() {
        let mut guard = InactivityGuard::default();
        assert_eq!(guard.state(), AuthState::Loading);
        assert_eq!(guard.check(t(10_000)), GuardDecision::Continue);

        guard.signed_out();
        assert_eq!(guard.check(t(10_000)), GuardDecision::Continue);
        assert_eq!(guard.deadline(), None);
    }

    #[test]
    fn test_expires_after_five_idle_minutes() {
        let mut guard = InactivityGuard::default();
        guard.signed_in(t(0));

        assert_eq!(guard.check(t(299)), GuardDecision::Continue);
        assert_eq!(guard.check(t(300)), GuardDecision::ForceSignOut);
    }

    #[test]
    fn test_interaction_resets_timer() {
        let mut guard = InactivityGuard::default();
        guard.signed_in(t(0));
        guard.record(Interaction::KeyDown, t(200));

        assert_eq!(guard.check(t(450)), GuardDecision::Continue);
        assert_eq!(guard.remaining(t(450)), Some(TimeDelta::seconds(50)));
        assert_eq!(guard.check(t(500)), GuardDecision::ForceSignOut);
    }

    #[test]
    fn test_late_interaction_does_not_revive() {
        let mut guard = InactivityGuard::default();
        guard.signed_in(t(0));
        guard.record(Interaction::Click, t(301));

        assert_eq!(guard.check(t(301)), GuardDecision::ForceSignOut);
        assert_eq!(guard.remaining(t(400)), Some(TimeDelta::zero()));
    }

    #[test]
    fn test_sign_out_after_force_is_observed() {
        let mut guard = InactivityGuard::resume(TimeDelta::seconds(60), t(0));
        assert_eq!(guard.check(t(61)), GuardDecision::ForceSignOut);

        guard.signed_out();

        assert_eq!(guard.state(), AuthState::SignedOut);
        assert_eq!(guard.check(t(61)), GuardDecision::Continue);
    }

    #[test]
    fn test_interactions_ignored_while_signed_out() {
        let mut guard = InactivityGuard::default();
        guard.record(Interaction::Scroll, t(5));
        assert_eq!(guard.state(), AuthState::Loading);
    }

    #[test]
    fn test_interaction_names() {
        for name in BROWSER_ACTIVITY_EVENTS {
            assert!(name.parse::<Interaction>().is_ok(), "{name}");
        }
        assert_eq!("navigation".parse::<Interaction>().unwrap(), Interaction::Navigation);
        assert!("resize".parse::<Interaction>().is_err());
    }
}
