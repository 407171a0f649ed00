//! Signed-in landing page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::Page;
use crate::error::AppError;
use crate::middleware::{CurrentTenant, RequireAuth, clear_current_user};
use crate::models::User;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: Page,
    pub user: User,
}

/// Show the dashboard for the logged-in user.
///
/// A session whose user no longer exists is dropped.
pub async fn show(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<Response, AppError> {
    let Some(user) = state.store().find_user(&tenant.scope(), current.id).await? else {
        tracing::warn!(user_id = %current.id, "Session user no longer exists");
        if let Err(e) = clear_current_user(&session).await {
            tracing::error!("Failed to clear session: {}", e);
        }
        return Ok(Redirect::to("/login").into_response());
    };

    Ok(DashboardTemplate {
        page: Page::new(&state, &tenant, &session).await,
        user,
    }
    .into_response())
}
