//! Social sign-in.
//!
//! An [`IdentityProvider`] turns an authorization code into a
//! [`ProviderIdentity`]; [`OAuthLoginService`] then finds, links or creates the
//! matching user inside the current tenant.

mod client;
mod reconcile;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stylecore_core::{EmailError, OAuthProvider};

use crate::config::StyleCoreConfig;
use crate::db::RepositoryError;

pub use client::OAuthClient;
pub use reconcile::{OAuthLoginService, Reconciliation, derive_username_base};

/// Errors from the OAuth flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the authorization code.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The provider did not return a usable profile.
    #[error("profile fetch failed: {0}")]
    Profile(String),

    /// No email in the profile and no linked account to fall back on.
    #[error("provider did not share an email address")]
    MissingEmail,

    /// The profile email could not be parsed.
    #[error("invalid email from provider: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The matched account may not sign in.
    #[error("account disabled")]
    AccountDisabled,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing error")]
    PasswordHash,
}

/// What the provider told us about the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    /// The provider's stable subject id.
    pub provider_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// An OAuth 2.0 authorization-code provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider(&self) -> OAuthProvider;

    /// Where to send the browser to start the flow.
    fn authorization_url(&self, redirect_uri: &str, state: &str) -> String;

    /// Exchange `code` and fetch the user's profile.
    async fn identity(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ProviderIdentity, OAuthError>;
}

/// One HTTP-backed provider per configured client.
#[must_use]
pub fn configured_providers(config: &StyleCoreConfig) -> Vec<Arc<dyn IdentityProvider>> {
    let http = reqwest::Client::new();
    OAuthProvider::ALL
        .into_iter()
        .filter_map(|provider| {
            config.oauth_client(provider).map(|client| {
                tracing::info!(provider = %provider, "OAuth provider enabled");
                Arc::new(OAuthClient::new(provider, client, http.clone()))
                    as Arc<dyn IdentityProvider>
            })
        })
        .collect()
}
