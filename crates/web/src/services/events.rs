//! Domain events and their listeners.
//!
//! Listeners run inline, in registration order, after the event's write has
//! committed. A failing listener is logged and reported to Sentry; it never
//! undoes the write or stops the remaining listeners.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stylecore_core::TenantScope;

use super::email::{EmailError, Mailer, verification_email};
use super::verification::VerificationSigner;
use crate::db::{Datastore, RepositoryError};
use crate::i18n::Locale;
use crate::models::User;

/// Something that happened in the domain.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A user signed up through the registration form.
    ///
    /// `origin` is the scheme and host of the tenant the user registered on.
    Registered { user: User, origin: String },
}

impl DomainEvent {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Registered { .. } => "registered",
        }
    }
}

/// Errors a listener may report.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("email error: {0}")]
    Email(#[from] EmailError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Reacts to domain events.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &DomainEvent) -> Result<(), ListenerError>;
}

/// Fans events out to every registered listener.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    listeners: Vec<Arc<dyn Listener>>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn Listener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Deliver `event` to every listener.
    pub async fn dispatch(&self, event: DomainEvent) {
        for listener in &self.listeners {
            if let Err(e) = listener.handle(&event).await {
                let event_id = sentry::capture_error(&e);
                tracing::error!(
                    event = event.name(),
                    listener = listener.name(),
                    error = %e,
                    sentry_event_id = %event_id,
                    "Event listener failed"
                );
            }
        }
    }
}

/// Sends the verification link on sign-up, or activates the account straight
/// away when verification is switched off.
pub struct EmailVerificationListener {
    store: Arc<dyn Datastore>,
    mailer: Arc<dyn Mailer>,
    signer: VerificationSigner,
    locale: Locale,
    require_verification: bool,
}

impl EmailVerificationListener {
    #[must_use]
    pub fn new(
        store: Arc<dyn Datastore>,
        mailer: Arc<dyn Mailer>,
        signer: VerificationSigner,
        locale: Locale,
        require_verification: bool,
    ) -> Self {
        Self {
            store,
            mailer,
            signer,
            locale,
            require_verification,
        }
    }
}

#[async_trait]
impl Listener for EmailVerificationListener {
    fn name(&self) -> &'static str {
        "email_verification"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), ListenerError> {
        let DomainEvent::Registered { user, origin } = event;

        if !self.require_verification {
            let scope = TenantScope::Tenant(user.tenant_id.clone());
            self.store.activate_user(&scope, user.id).await?;
            tracing::info!(user_id = %user.id, "Verification disabled, user activated");
            return Ok(());
        }

        if user.has_verified_email() {
            return Ok(());
        }

        send_verification_link(
            self.mailer.as_ref(),
            &self.signer,
            self.locale,
            user,
            origin,
        )
        .await?;
        Ok(())
    }
}

/// Render and send the verification email for `user`.
///
/// # Errors
///
/// Returns `EmailError` if rendering or delivery fails.
pub async fn send_verification_link(
    mailer: &dyn Mailer,
    signer: &VerificationSigner,
    locale: Locale,
    user: &User,
    origin: &str,
) -> Result<(), EmailError> {
    let url = signer.url(origin, user);
    let email = verification_email(locale, &user.email, &user.name, &url)?;
    mailer.send(email).await?;
    tracing::info!(user_id = %user.id, "Verification email sent");
    Ok(())
}
