//! Login, registration and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use stylecore_core::OAuthProvider;

use super::Page;
use crate::error::{AppError, FieldErrors, clear_sentry_user, set_sentry_user};
use crate::i18n::Message;
use crate::middleware::{CurrentTenant, clear_current_user, set_current_user, set_flash};
use crate::models::{CurrentUser, Flash};
use crate::services::auth::{AuthError, AuthService};
use crate::services::registration::{RegistrationError, RegistrationForm, RegistrationService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: Page,
    pub email: String,
    pub providers: Vec<OAuthProvider>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: Page,
    pub form: RegistrationForm,
    pub phone: String,
    pub register_as: String,
    pub errors: FieldErrors,
}

impl RegisterTemplate {
    fn new(page: Page, form: RegistrationForm, errors: FieldErrors) -> Self {
        Self {
            page,
            phone: form.phone.clone().unwrap_or_default(),
            register_as: form
                .register_as
                .clone()
                .unwrap_or_else(|| "customer".to_string()),
            form: form.without_passwords(),
            errors,
        }
    }
}

/// "Check your email" page shown after registering.
#[derive(Template, WebTemplate)]
#[template(path = "auth/verify_notice.html")]
pub struct VerifyNoticeTemplate {
    pub page: Page,
    pub email: String,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    session: Session,
) -> impl IntoResponse {
    LoginTemplate {
        page: Page::new(&state, &tenant, &session).await,
        email: String::new(),
        providers: state.enabled_providers(),
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let locale = state.config().locale;
    let result = AuthService::new(state.store())
        .login_with_password(&tenant.scope(), &form.email, &form.password)
        .await;

    let user = match result {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => {
            tracing::info!(tenant_id = %tenant.tenant.id, "Login failed: invalid credentials");
            let page = Page {
                flash: Some(Flash::error(locale.text(Message::InvalidCredentials))),
                ..Page::new(&state, &tenant, &session).await
            };
            let body = LoginTemplate {
                page,
                email: form.email,
                providers: state.enabled_providers(),
            };
            return Ok((StatusCode::UNAUTHORIZED, body).into_response());
        }
        Err(AuthError::AccountDisabled) => {
            set_flash(&session, Flash::error(locale.text(Message::AccountDisabled))).await;
            return Ok(Redirect::to("/login").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, tenant_id = %user.tenant_id, "User logged in");
    Ok(Redirect::to("/dashboard").into_response())
}

/// Log out and return to the login page.
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();
    set_flash(
        &session,
        Flash::success(state.config().locale.text(Message::LoggedOut)),
    )
    .await;
    Redirect::to("/login").into_response()
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    session: Session,
) -> impl IntoResponse {
    RegisterTemplate::new(
        Page::new(&state, &tenant, &session).await,
        RegistrationForm::default(),
        FieldErrors::new(),
    )
}

/// Handle registration.
///
/// Invalid input re-renders the form with 422. On success the user is logged
/// in; with verification required they see the "check your email" page,
/// otherwise they go straight to the dashboard.
pub async fn register(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    session: Session,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, AppError> {
    let origin = tenant.origin(state.config().scheme());
    let result = RegistrationService::new(state.store(), state.events())
        .register(&tenant.scope(), form.clone(), &origin)
        .await;

    let user = match result {
        Ok(user) => user,
        Err(RegistrationError::Invalid(errors)) => {
            let page = Page::new(&state, &tenant, &session).await;
            let body = RegisterTemplate::new(page, form.normalized(), errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, body).into_response());
        }
        Err(RegistrationError::Repository(e)) => return Err(e.into()),
        Err(RegistrationError::PasswordHash) => {
            return Err(AppError::Internal("password hashing failed".to_string()));
        }
    };

    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    if !state.config().require_email_verification {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    Ok(VerifyNoticeTemplate {
        page: Page::new(&state, &tenant, &session).await,
        email: user.email.into_inner(),
    }
    .into_response())
}
