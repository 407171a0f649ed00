//! Social sign-in route handlers.
//!
//! Handles the authorization-code flow for every configured provider:
//! - Redirect: stores a CSRF `state` in the session and sends the browser to
//!   the provider
//! - Callback: checks `state`, fetches the identity and logs the matching user
//!   in
//!
//! Anything that goes wrong after the provider is known ends on `/login` with
//! a flash message. There is no retry.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use stylecore_core::OAuthProvider;

use crate::error::set_sentry_user;
use crate::i18n::Message;
use crate::middleware::{CurrentTenant, set_current_user, set_flash};
use crate::models::{CurrentUser, Flash, session_keys};
use crate::services::auth::generate_random_string;
use crate::services::oauth::{IdentityProvider, OAuthError, OAuthLoginService};
use crate::state::AppState;

const STATE_LENGTH: usize = 40;

/// Query parameters from the provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for a token.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

/// The enabled provider named in the path.
///
/// Unknown names and providers without a configured client are both 404.
fn enabled_provider<'a>(
    state: &'a AppState,
    name: &str,
) -> Result<(OAuthProvider, &'a dyn IdentityProvider), StatusCode> {
    let provider: OAuthProvider = name.parse().map_err(|_| StatusCode::NOT_FOUND)?;
    let client = state.provider(provider).ok_or(StatusCode::NOT_FOUND)?;
    Ok((provider, client))
}

fn callback_url(state: &AppState, tenant: &CurrentTenant, provider: OAuthProvider) -> String {
    format!(
        "{}/auth/{provider}/callback",
        tenant.origin(state.config().scheme())
    )
}

async fn fail(state: &AppState, session: &Session, message: Message) -> Response {
    set_flash(session, Flash::error(state.config().locale.text(message))).await;
    Redirect::to("/login").into_response()
}

/// Start the flow.
///
/// # Route
///
/// `GET /auth/{provider}/redirect`
pub async fn redirect(
    State(state): State<AppState>,
    Path(name): Path<String>,
    tenant: CurrentTenant,
    session: Session,
) -> Response {
    let (provider, client) = match enabled_provider(&state, &name) {
        Ok(found) => found,
        Err(status) => return status.into_response(),
    };

    let oauth_state = generate_random_string(STATE_LENGTH);
    if let Err(e) = session.insert(session_keys::OAUTH_STATE, &oauth_state).await {
        tracing::error!("Failed to store OAuth state in session: {}", e);
        return fail(&state, &session, Message::OAuthFailed).await;
    }

    let url = client.authorization_url(&callback_url(&state, &tenant, provider), &oauth_state);
    Redirect::to(&url).into_response()
}

/// Finish the flow.
///
/// # Route
///
/// `GET /auth/{provider}/callback`
pub async fn callback(
    State(state): State<AppState>,
    Path(name): Path<String>,
    tenant: CurrentTenant,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let (provider, client) = match enabled_provider(&state, &name) {
        Ok(found) => found,
        Err(status) => return status.into_response(),
    };

    // One-time use, whatever happens next
    let stored_state: Option<String> = session
        .remove(session_keys::OAUTH_STATE)
        .await
        .ok()
        .flatten();

    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!(provider = %provider, "OAuth error: {} - {}", error, description);
        return fail(&state, &session, Message::OAuthDenied).await;
    }

    if query.state.is_none() || stored_state != query.state {
        tracing::warn!(provider = %provider, "OAuth state mismatch");
        return fail(&state, &session, Message::OAuthStateMismatch).await;
    }

    let Some(code) = query.code else {
        tracing::warn!(provider = %provider, "OAuth callback missing code");
        return fail(&state, &session, Message::OAuthFailed).await;
    };

    let identity = match client
        .identity(&code, &callback_url(&state, &tenant, provider))
        .await
    {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!(provider = %provider, "Failed to fetch OAuth identity: {}", e);
            return fail(&state, &session, Message::OAuthFailed).await;
        }
    };

    let reconciled = OAuthLoginService::new(state.store())
        .reconcile(&tenant.scope(), provider, identity)
        .await;
    let user = match reconciled {
        Ok((user, _)) => user,
        Err(OAuthError::MissingEmail) => {
            tracing::info!(provider = %provider, "OAuth profile without email");
            return fail(&state, &session, Message::OAuthMissingEmail).await;
        }
        Err(OAuthError::AccountDisabled) => {
            return fail(&state, &session, Message::AccountDisabled).await;
        }
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(
                provider = %provider,
                error = %e,
                sentry_event_id = %event_id,
                "OAuth reconciliation failed"
            );
            return fail(&state, &session, Message::OAuthFailed).await;
        }
    };

    if let Err(e) = set_current_user(&session, &CurrentUser::from(&user)).await {
        tracing::error!("Failed to store user in session: {}", e);
        return fail(&state, &session, Message::OAuthFailed).await;
    }
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Redirect::to("/dashboard").into_response()
}
