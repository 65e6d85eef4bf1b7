//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with an empty `request_id` field)
//! 3. Request ID (accept or assign `x-request-id`, record it on the span)
//! 4. Session layer (tower-sessions with the in-memory store)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{CurrentUser, LOGIN_PATH, LoginRequired, RequireUser};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
