//! Email verification links.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use stylecore_core::UserId;

use crate::error::AppError;
use crate::i18n::Message;
use crate::middleware::{CurrentTenant, RequireAuth, set_flash};
use crate::models::Flash;
use crate::services::events::send_verification_link;
use crate::state::AppState;

/// Follow a signed verification link.
///
/// Unknown users and bad signatures are both 403 so the link cannot be used
/// to probe for accounts.
///
/// # Route
///
/// `GET /email/verify/{id}/{signature}`
pub async fn verify(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    session: Session,
    Path((id, signature)): Path<(i32, String)>,
) -> Result<Response, AppError> {
    let scope = tenant.scope();
    let Some(user) = state.store().find_user(&scope, UserId::new(id)).await? else {
        return Ok(StatusCode::FORBIDDEN.into_response());
    };

    if state.signer().verify(&user, &signature).is_err() {
        tracing::warn!(user_id = %user.id, "Invalid email verification signature");
        return Ok(StatusCode::FORBIDDEN.into_response());
    }

    if user.has_verified_email() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    state.store().mark_email_verified(&scope, user.id).await?;
    tracing::info!(user_id = %user.id, tenant_id = %user.tenant_id, "Email verified");

    set_flash(
        &session,
        Flash::success(state.config().locale.text(Message::EmailVerified)),
    )
    .await;
    Ok(Redirect::to("/dashboard").into_response())
}

/// Send the verification link again to the logged-in user.
///
/// # Route
///
/// `POST /email/verification-notification`
pub async fn resend(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<Response, AppError> {
    let user = state
        .store()
        .find_user(&tenant.scope(), current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("session user not found".to_string()))?;

    if user.has_verified_email() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let config = state.config();
    send_verification_link(
        state.mailer(),
        state.signer(),
        config.locale,
        &user,
        &tenant.origin(config.scheme()),
    )
    .await
    .map_err(|e| AppError::Internal(format!("verification email failed: {e}")))?;

    set_flash(
        &session,
        Flash::success(config.locale.text(Message::VerificationLinkSent)),
    )
    .await;
    Ok(Redirect::to("/dashboard").into_response())
}
