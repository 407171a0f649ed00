//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::Arc;

use stylecore_core::OAuthProvider;

use crate::config::StyleCoreConfig;
use crate::db::Datastore;
use crate::services::email::Mailer;
use crate::services::events::{EmailVerificationListener, EventDispatcher};
use crate::services::oauth::IdentityProvider;
use crate::services::verification::{VerificationError, VerificationSigner};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the datastore, mailer and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StyleCoreConfig,
    store: Arc<dyn Datastore>,
    providers: HashMap<OAuthProvider, Arc<dyn IdentityProvider>>,
    mailer: Arc<dyn Mailer>,
    signer: VerificationSigner,
    events: EventDispatcher,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Wires the email verification listener to the event dispatcher.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration
    /// * `store` - Datastore (Postgres in production, in-memory in tests)
    /// * `mailer` - Outgoing mail backend
    /// * `providers` - Enabled OAuth identity providers
    ///
    /// # Errors
    ///
    /// Returns an error if the app key cannot key the link signer.
    pub fn new(
        config: StyleCoreConfig,
        store: Arc<dyn Datastore>,
        mailer: Arc<dyn Mailer>,
        providers: Vec<Arc<dyn IdentityProvider>>,
    ) -> Result<Self, VerificationError> {
        let signer = VerificationSigner::new(&config.app_key)?;
        let listener = EmailVerificationListener::new(
            Arc::clone(&store),
            Arc::clone(&mailer),
            signer.clone(),
            config.locale,
            config.require_email_verification,
        );
        let events = EventDispatcher::new().with_listener(Arc::new(listener));
        let providers = providers.into_iter().map(|p| (p.provider(), p)).collect();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                providers,
                mailer,
                signer,
                events,
            }),
        })
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &StyleCoreConfig {
        &self.inner.config
    }

    /// Get a reference to the datastore.
    #[must_use]
    pub fn store(&self) -> &dyn Datastore {
        self.inner.store.as_ref()
    }

    /// The identity provider for `provider`, if a client is configured.
    #[must_use]
    pub fn provider(&self, provider: OAuthProvider) -> Option<&dyn IdentityProvider> {
        self.inner.providers.get(&provider).map(|p| p.as_ref())
    }

    /// Providers to offer on the login page, in a stable order.
    #[must_use]
    pub fn enabled_providers(&self) -> Vec<OAuthProvider> {
        OAuthProvider::ALL
            .into_iter()
            .filter(|p| self.inner.providers.contains_key(p))
            .collect()
    }

    #[must_use]
    pub fn mailer(&self) -> &dyn Mailer {
        self.inner.mailer.as_ref()
    }

    #[must_use]
    pub fn signer(&self) -> &VerificationSigner {
        &self.inner.signer
    }

    #[must_use]
    pub fn events(&self) -> &EventDispatcher {
        &self.inner.events
    }
}
