//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store, SameSite=Strict)
//! 4. Security headers (CSP, no-store, etc.)
//! 5. Inactivity guard (panel pages only)
//! 6. Rate limiting (governor, login only)

pub mod auth;
pub mod inactivity;
pub mod rate_limit;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAdminAuth, RequireAdminAuth, clear_current_admin, set_current_admin};
pub use inactivity::{ActivityStatus, EXPIRED_LOGIN_PATH, evaluate_activity, inactivity_middleware};
pub use rate_limit::auth_rate_limiter;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
