//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Inactivity guard (page routes only)
//! 5. Security headers (CSP, frame options, etc.)
//! 6. Rate limiting (governor, auth routes only)

pub mod auth;
pub mod inactivity;
pub mod rate_limit;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, clear_current_user, set_current_user};
pub use inactivity::{ActivityStatus, evaluate_activity, inactivity_middleware};
pub use rate_limit::auth_rate_limiter;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
