//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request span with `request_id` and `tenant_id` fields)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Session layer (tower-sessions)
//! 6. Tenant resolution (tenant routes only)

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod tenant;

pub use auth::{
    OptionalAuth, RequireAuth, clear_current_user, set_current_user, set_flash, take_flash,
};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use tenant::{CurrentTenant, resolve_tenant};
