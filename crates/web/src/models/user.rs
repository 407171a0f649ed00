//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stylecore_core::{
    Email, OAuthProvider, TenantId, TenantScoped, UserId, UserRole, UserStatus, UserType,
};

/// A user of one tenant.
///
/// `tenant_id` is written once at creation; no store operation updates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub name: String,
    pub username: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: UserRole,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub status: UserStatus,
    pub email_verified_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub google_id: Option<String>,
    #[serde(skip)]
    pub facebook_id: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub const fn has_verified_email(&self) -> bool {
        self.email_verified_at.is_some()
    }

    /// The subject id linked for `provider`, if any.
    #[must_use]
    pub fn provider_id(&self, provider: OAuthProvider) -> Option<&str> {
        match provider {
            OAuthProvider::Google => self.google_id.as_deref(),
            OAuthProvider::Facebook => self.facebook_id.as_deref(),
        }
    }
}

impl TenantScoped for User {
    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

/// Values for inserting a user and its password row.
///
/// `tenant_id` may be left unset; the store stamps it from the active scope.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub tenant_id: Option<TenantId>,
    pub name: String,
    pub username: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: UserRole,
    pub user_type: UserType,
    pub status: UserStatus,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub google_id: Option<String>,
    pub facebook_id: Option<String>,
    pub avatar: Option<String>,
    pub password_hash: String,
}

impl NewUser {
    /// Attach a provider subject id.
    #[must_use]
    pub fn with_provider_id(mut self, provider: OAuthProvider, provider_id: String) -> Self {
        match provider {
            OAuthProvider::Google => self.google_id = Some(provider_id),
            OAuthProvider::Facebook => self.facebook_id = Some(provider_id),
        }
        self
    }
}
