//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness (no tenant)
//! GET  /health/ready                        - Database ping (no tenant)
//!
//! # Tenant routes (host must map to a tenant, else 404)
//! GET  /                                    - Redirect to dashboard
//! GET  /login                               - Login page
//! POST /login                               - Password login
//! GET  /register                            - Registration page
//! POST /register                            - Register (422 with field errors)
//! POST /logout                              - Flush the session
//! GET  /dashboard                           - Requires auth
//!
//! # Social sign-in
//! GET  /auth/{provider}/redirect            - Redirect to provider
//! GET  /auth/{provider}/callback            - Find, link or create the user
//!
//! # Email verification
//! GET  /email/verify/{id}/{signature}       - Signed link (403 if tampered)
//! POST /email/verification-notification     - Resend link (requires auth)
//!
//! # Establishments (JSON, requires auth)
//! POST /establishments                      - Create (owners only)
//! GET  /establishments/{id}                 - Show (owner, staff, managers)
//! POST /establishments/{id}/staff           - Add staff (owner only)
//! ```

pub mod auth;
pub mod dashboard;
pub mod establishments;
pub mod health;
pub mod oauth;
pub mod verification;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::{CurrentTenant, take_flash};
use crate::models::Flash;
use crate::state::AppState;

/// Layout data every page template renders.
pub struct Page {
    pub lang: &'static str,
    pub tenant_name: String,
    pub flash: Option<Flash>,
}

impl Page {
    /// Build the layout for `tenant`, consuming any pending flash message.
    pub async fn new(state: &AppState, tenant: &CurrentTenant, session: &Session) -> Self {
        Self {
            lang: state.config().locale.tag(),
            tenant_name: tenant.tenant.name.clone(),
            flash: take_flash(session).await,
        }
    }
}

/// Routes that do not depend on a tenant.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::live))
        .route("/health/ready", get(health::ready))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/auth/{provider}/redirect", get(oauth::redirect))
        .route("/auth/{provider}/callback", get(oauth::callback))
}

/// Create the email verification routes router.
pub fn verification_routes() -> Router<AppState> {
    Router::new()
        .route("/email/verify/{id}/{signature}", get(verification::verify))
        .route(
            "/email/verification-notification",
            post(verification::resend),
        )
}

/// Create the establishment routes router.
pub fn establishment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(establishments::create))
        .route("/{id}", get(establishments::show))
        .route("/{id}/staff", post(establishments::add_staff))
}

/// Create all tenant-scoped routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/dashboard", get(dashboard::show))
        .merge(auth_routes())
        .merge(verification_routes())
        .nest("/establishments", establishment_routes())
}
