//! Find, link or create the user behind a provider identity.

use chrono::Utc;
use rand::Rng;

use stylecore_core::{Email, OAuthProvider, RegisterAs, TenantScope, UserStatus};

use super::{OAuthError, ProviderIdentity};
use crate::db::{Datastore, RepositoryError};
use crate::models::{NewUser, User};
use crate::services::auth::unusable_password_hash;
use crate::services::registration::is_username_char;

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_BASE_LENGTH: usize = 40;
const MAX_NUMBERED_SUFFIX: u32 = 50;
const CREATE_ATTEMPTS: usize = 3;
const FALLBACK_USERNAME: &str = "user";

/// How a callback was matched to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The provider id was already linked.
    Existing,
    /// An account with the same email now carries the provider id.
    Linked,
    /// A new active account was created.
    Created,
}

impl Reconciliation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Linked => "linked",
            Self::Created => "created",
        }
    }
}

/// Username stem from an email local part: allowed characters only, at most
/// 40 long, `user` when too little survives.
#[must_use]
pub fn derive_username_base(email: &Email) -> String {
    let base: String = email
        .local_part()
        .to_lowercase()
        .chars()
        .filter(|c| is_username_char(*c))
        .take(MAX_USERNAME_BASE_LENGTH)
        .collect();

    if base.chars().count() < MIN_USERNAME_LENGTH {
        FALLBACK_USERNAME.to_owned()
    } else {
        base
    }
}

/// Social sign-in reconciliation.
pub struct OAuthLoginService<'a> {
    store: &'a dyn Datastore,
}

impl<'a> OAuthLoginService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Datastore) -> Self {
        Self { store }
    }

    /// Resolve `identity` to a user of the scoped tenant.
    ///
    /// Checked in order: linked provider id, then matching email (which gets
    /// the provider id linked and a missing avatar filled), then a new active
    /// account with a verified email.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::MissingEmail` when nothing is linked and the
    /// provider shared no email. Returns `OAuthError::AccountDisabled` for
    /// suspended or inactive accounts.
    pub async fn reconcile(
        &self,
        scope: &TenantScope,
        provider: OAuthProvider,
        identity: ProviderIdentity,
    ) -> Result<(User, Reconciliation), OAuthError> {
        let (user, outcome) = self.find_link_or_create(scope, provider, identity).await?;

        if !user.status.can_sign_in() {
            return Err(OAuthError::AccountDisabled);
        }

        tracing::info!(
            provider = %provider,
            user_id = %user.id,
            tenant_id = %user.tenant_id,
            outcome = outcome.as_str(),
            "OAuth sign-in reconciled"
        );
        Ok((user, outcome))
    }

    async fn find_link_or_create(
        &self,
        scope: &TenantScope,
        provider: OAuthProvider,
        identity: ProviderIdentity,
    ) -> Result<(User, Reconciliation), OAuthError> {
        if let Some(user) = self
            .store
            .find_user_by_provider(scope, provider, &identity.provider_id)
            .await?
        {
            return Ok((user, Reconciliation::Existing));
        }

        let raw_email = identity
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(OAuthError::MissingEmail)?;
        let email = Email::parse(raw_email)?;

        if let Some(user) = self.store.find_user_by_email(scope, &email).await? {
            // Disabled accounts stay untouched.
            if !user.status.can_sign_in() {
                return Err(OAuthError::AccountDisabled);
            }
            let linked = self
                .store
                .link_provider(
                    scope,
                    user.id,
                    provider,
                    &identity.provider_id,
                    identity.avatar.as_deref(),
                )
                .await?;
            return Ok((linked, Reconciliation::Linked));
        }

        let user = self.create(scope, provider, identity, email).await?;
        Ok((user, Reconciliation::Created))
    }

    async fn create(
        &self,
        scope: &TenantScope,
        provider: OAuthProvider,
        identity: ProviderIdentity,
        email: Email,
    ) -> Result<User, OAuthError> {
        let (role, user_type) = RegisterAs::default().classify();
        let password_hash = unusable_password_hash().map_err(|_| OAuthError::PasswordHash)?;
        let name = identity
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.local_part().to_owned());

        let mut last_err = RepositoryError::Conflict("username".to_owned());
        for _ in 0..CREATE_ATTEMPTS {
            let username = self.unique_username(&email).await?;
            let new_user = NewUser {
                tenant_id: None,
                name: name.clone(),
                username,
                email: email.clone(),
                phone: None,
                role,
                user_type,
                status: UserStatus::Active,
                email_verified_at: Some(Utc::now()),
                google_id: None,
                facebook_id: None,
                avatar: identity.avatar.clone(),
                password_hash: password_hash.clone(),
            }
            .with_provider_id(provider, identity.provider_id.clone());

            match self.store.create_user(scope, new_user).await {
                Ok(user) => return Ok(user),
                // Lost a race for the username; pick another.
                Err(RepositoryError::Conflict(field)) if field == "username" => {
                    tracing::debug!("Generated username taken concurrently, retrying");
                    last_err = RepositoryError::Conflict(field);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(last_err.into())
    }

    /// The email stem, then the stem with `1`, `2`, ... appended, then a
    /// random four-digit suffix.
    async fn unique_username(&self, email: &Email) -> Result<String, OAuthError> {
        let base = derive_username_base(email);
        if !self.store.username_exists(&base).await? {
            return Ok(base);
        }
        for n in 1..=MAX_NUMBERED_SUFFIX {
            let candidate = format!("{base}{n}");
            if !self.store.username_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        let suffix: u32 = rand::rng().random_range(1000..10000);
        Ok(format!("{base}{suffix}"))
    }
}
