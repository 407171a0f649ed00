//! `PostgreSQL`-backed [`Datastore`](super::Datastore).

use async_trait::async_trait;
use sqlx::PgPool;

use stylecore_core::{
    Email, EstablishmentId, OAuthProvider, TenantBlueprint, TenantId, TenantScope, UserId,
};

use super::establishments::EstablishmentRepository;
use super::tenants::TenantRepository;
use super::users::UserRepository;
use super::{EstablishmentStore, RepositoryError, TenantStore, UserStore};
use crate::models::{Domain, Establishment, NewEstablishment, NewUser, Tenant, User};

/// Store delegating to the per-table repositories.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }

    fn tenants(&self) -> TenantRepository<'_> {
        TenantRepository::new(&self.pool)
    }

    fn establishments(&self) -> EstablishmentRepository<'_> {
        EstablishmentRepository::new(&self.pool)
    }
}

#[async_trait]
impl TenantStore for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_tenant(
        &self,
        blueprint: &TenantBlueprint,
    ) -> Result<(Tenant, Domain), RepositoryError> {
        self.tenants().create(blueprint).await
    }

    async fn tenant_for_domain(&self, domain: &str) -> Result<Option<Tenant>, RepositoryError> {
        self.tenants().get_by_domain(domain).await
    }

    async fn add_domain(
        &self,
        tenant_id: &TenantId,
        domain: &str,
    ) -> Result<Domain, RepositoryError> {
        self.tenants().add_domain(tenant_id, domain).await
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        scope: &TenantScope,
        user: NewUser,
    ) -> Result<User, RepositoryError> {
        self.users().create(scope, user).await
    }

    async fn find_user(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<Option<User>, RepositoryError> {
        self.users().get_by_id(scope, id).await
    }

    async fn find_user_by_email(
        &self,
        scope: &TenantScope,
        email: &Email,
    ) -> Result<Option<User>, RepositoryError> {
        self.users().get_by_email(scope, email).await
    }

    async fn find_user_by_provider(
        &self,
        scope: &TenantScope,
        provider: OAuthProvider,
        provider_id: &str,
    ) -> Result<Option<User>, RepositoryError> {
        self.users()
            .get_by_provider(scope, provider, provider_id)
            .await
    }

    async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        self.users().username_exists(username).await
    }

    async fn password_hash(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<Option<String>, RepositoryError> {
        self.users().get_password_hash(scope, id).await
    }

    async fn link_provider(
        &self,
        scope: &TenantScope,
        id: UserId,
        provider: OAuthProvider,
        provider_id: &str,
        avatar: Option<&str>,
    ) -> Result<User, RepositoryError> {
        self.users()
            .link_provider(scope, id, provider, provider_id, avatar)
            .await
    }

    async fn mark_email_verified(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<User, RepositoryError> {
        self.users().mark_email_verified(scope, id).await
    }

    async fn activate_user(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<User, RepositoryError> {
        self.users().activate(scope, id).await
    }
}

#[async_trait]
impl EstablishmentStore for PgStore {
    async fn create_establishment(
        &self,
        scope: &TenantScope,
        establishment: NewEstablishment,
    ) -> Result<Establishment, RepositoryError> {
        self.establishments().create(scope, establishment).await
    }

    async fn find_establishment(
        &self,
        scope: &TenantScope,
        id: EstablishmentId,
    ) -> Result<Option<Establishment>, RepositoryError> {
        self.establishments().get_by_id(scope, id).await
    }

    async fn staff_ids(
        &self,
        scope: &TenantScope,
        id: EstablishmentId,
    ) -> Result<Vec<UserId>, RepositoryError> {
        self.establishments().staff_ids(scope, id).await
    }

    async fn add_staff(
        &self,
        scope: &TenantScope,
        id: EstablishmentId,
        user: UserId,
    ) -> Result<(), RepositoryError> {
        self.establishments().add_staff(scope, id, user).await
    }
}
