//! Data access for StyleCore.
//!
//! # Tables
//!
//! - `tenants` / `domains` - Tenant registry and hostname routing (global)
//! - `users` / `user_password` - Tenant-scoped accounts and their password hashes
//! - `establishments` / `establishment_staff` - Tenant-scoped salons and staff membership
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! Every tenant-scoped operation takes a [`TenantScope`]. Reads, updates and
//! deletes under `TenantScope::Tenant` only ever touch that tenant's rows;
//! inserts stamp `tenant_id` via [`TenantScope::stamp`].
//!
//! Two implementations share the traits below: [`PgStore`] for production and
//! [`MemoryStore`] for tests and local experiments. Both enforce the same
//! uniqueness rules.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p stylecore-cli -- migrate
//! ```

pub mod establishments;
pub mod memory;
pub mod postgres;
pub mod scope;
pub mod tenants;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use stylecore_core::{
    Email, EstablishmentId, OAuthProvider, ScopeError, TenantBlueprint, TenantId, TenantScope,
    UserId,
};

use crate::models::{Domain, Establishment, NewEstablishment, NewUser, Tenant, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors from the data layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// A unique constraint rejected the write. Carries the offending field
    /// (`email`, `username`, `domain`, `tenant`, ...).
    #[error("constraint violation: {0} already exists")]
    Conflict(String),

    /// The row could not be stamped with a tenant.
    #[error("tenant scope violation: {0}")]
    Scope(#[from] ScopeError),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Tenant registry. Tenants and domains are global, not tenant-scoped.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Check the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Insert a tenant and its default domain.
    ///
    /// Fails with `Conflict("tenant")` or `Conflict("domain")` on duplicates.
    async fn create_tenant(
        &self,
        blueprint: &TenantBlueprint,
    ) -> Result<(Tenant, Domain), RepositoryError>;

    /// Resolve a normalized hostname to its tenant.
    async fn tenant_for_domain(&self, domain: &str) -> Result<Option<Tenant>, RepositoryError>;

    /// Map an additional hostname to a tenant.
    async fn add_domain(
        &self,
        tenant_id: &TenantId,
        domain: &str,
    ) -> Result<Domain, RepositoryError>;
}

/// Tenant-scoped user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and its password row atomically.
    async fn create_user(
        &self,
        scope: &TenantScope,
        user: NewUser,
    ) -> Result<User, RepositoryError>;

    async fn find_user(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<Option<User>, RepositoryError>;

    async fn find_user_by_email(
        &self,
        scope: &TenantScope,
        email: &Email,
    ) -> Result<Option<User>, RepositoryError>;

    async fn find_user_by_provider(
        &self,
        scope: &TenantScope,
        provider: OAuthProvider,
        provider_id: &str,
    ) -> Result<Option<User>, RepositoryError>;

    /// Usernames are unique across all tenants.
    async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError>;

    async fn password_hash(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<Option<String>, RepositoryError>;

    /// Store a provider subject id and fill the avatar if the user has none.
    async fn link_provider(
        &self,
        scope: &TenantScope,
        id: UserId,
        provider: OAuthProvider,
        provider_id: &str,
        avatar: Option<&str>,
    ) -> Result<User, RepositoryError>;

    /// Set `email_verified_at` (if unset) and make the account active.
    async fn mark_email_verified(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<User, RepositoryError>;

    /// Activate a pending account without touching verification.
    async fn activate_user(&self, scope: &TenantScope, id: UserId)
    -> Result<User, RepositoryError>;
}

/// Tenant-scoped establishments and staff membership.
#[async_trait]
pub trait EstablishmentStore: Send + Sync {
    /// Fails with `NotFound` unless the owner belongs to the stamped tenant.
    async fn create_establishment(
        &self,
        scope: &TenantScope,
        establishment: NewEstablishment,
    ) -> Result<Establishment, RepositoryError>;

    async fn find_establishment(
        &self,
        scope: &TenantScope,
        id: EstablishmentId,
    ) -> Result<Option<Establishment>, RepositoryError>;

    async fn staff_ids(
        &self,
        scope: &TenantScope,
        id: EstablishmentId,
    ) -> Result<Vec<UserId>, RepositoryError>;

    /// Add `user` to the staff. Adding an existing member is a no-op.
    async fn add_staff(
        &self,
        scope: &TenantScope,
        id: EstablishmentId,
        user: UserId,
    ) -> Result<(), RepositoryError>;
}

/// Everything the application needs from storage.
pub trait Datastore: TenantStore + UserStore + EstablishmentStore {}

impl<T> Datastore for T where T: TenantStore + UserStore + EstablishmentStore {}

/// Map a unique violation to `Conflict(field)`, keeping other errors as-is.
pub(crate) fn map_unique_violation(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        let field = match db_err.constraint() {
            Some("users_tenant_email_key") => "email",
            Some("users_username_key") => "username",
            Some("users_tenant_google_id_key") => "google_id",
            Some("users_tenant_facebook_id_key") => "facebook_id",
            Some("domains_pkey") => "domain",
            Some("tenants_pkey") => "tenant",
            Some(other) => other,
            None => "record",
        };
        return RepositoryError::Conflict(field.to_owned());
    }
    RepositoryError::Database(err)
}
