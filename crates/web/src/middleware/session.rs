//! Session middleware configuration.
//!
//! Production uses the `PostgreSQL` store from `tower-sessions-sqlx-store`;
//! tests pass an in-memory store. Cookies are host-only, so each tenant
//! subdomain gets its own session.

use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::StyleCoreConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "stylecore_session";

/// Session expiry time in seconds (2 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 2 * 60 * 60;

/// Create the session layer over `store`.
///
/// # Arguments
///
/// * `store` - Session store
/// * `config` - Application configuration (for the `Secure` flag)
#[must_use]
pub fn create_session_layer<Store>(
    store: Store,
    config: &StyleCoreConfig,
) -> SessionManagerLayer<Store>
where
    Store: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
