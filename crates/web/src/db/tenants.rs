//! Tenant and domain repository for `PostgreSQL`.

use sqlx::PgPool;

use stylecore_core::{TenantBlueprint, TenantId};

use super::{RepositoryError, map_unique_violation};
use crate::models::{Domain, Tenant};

/// Repository for the global tenant registry.
pub struct TenantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TenantRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a tenant and its default domain in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the tenant id or domain exists.
    pub async fn create(
        &self,
        blueprint: &TenantBlueprint,
    ) -> Result<(Tenant, Domain), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let tenant: Tenant = sqlx::query_as(
            "INSERT INTO tenants (id, name, email) VALUES ($1, $2, $3) \
             RETURNING id, name, email, created_at, updated_at",
        )
        .bind(&blueprint.id)
        .bind(&blueprint.name)
        .bind(&blueprint.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        let domain: Domain = sqlx::query_as(
            "INSERT INTO domains (domain, tenant_id) VALUES ($1, $2) RETURNING domain, tenant_id",
        )
        .bind(&blueprint.domain)
        .bind(&tenant.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        tx.commit().await?;
        Ok((tenant, domain))
    }

    /// Resolve a hostname to its tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_domain(&self, domain: &str) -> Result<Option<Tenant>, RepositoryError> {
        let tenant = sqlx::query_as(
            "SELECT t.id, t.name, t.email, t.created_at, t.updated_at \
             FROM tenants t JOIN domains d ON d.tenant_id = t.id \
             WHERE d.domain = $1",
        )
        .bind(domain)
        .fetch_optional(self.pool)
        .await?;
        Ok(tenant)
    }

    /// Map an extra hostname to a tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the domain is already mapped.
    pub async fn add_domain(
        &self,
        tenant_id: &TenantId,
        domain: &str,
    ) -> Result<Domain, RepositoryError> {
        let domain = sqlx::query_as(
            "INSERT INTO domains (domain, tenant_id) VALUES ($1, $2) RETURNING domain, tenant_id",
        )
        .bind(domain)
        .bind(tenant_id)
        .fetch_one(self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(domain)
    }
}
