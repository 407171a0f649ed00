//! Establishment repository for `PostgreSQL`.

use sqlx::{PgPool, Postgres, QueryBuilder};

use stylecore_core::{EstablishmentId, TenantScope, UserId};

use super::scope::constrain;
use super::{RepositoryError, map_unique_violation};
use crate::models::{Establishment, NewEstablishment};

const ESTABLISHMENT_COLUMNS: &str =
    "id, tenant_id, owner_id, name, description, created_at, updated_at";

/// Repository for establishments and their staff.
pub struct EstablishmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EstablishmentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an establishment owned by a user of the same tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Scope` if the tenant cannot be stamped and
    /// `RepositoryError::NotFound` if the owner is not a user of that tenant.
    pub async fn create(
        &self,
        scope: &TenantScope,
        establishment: NewEstablishment,
    ) -> Result<Establishment, RepositoryError> {
        let tenant_id = scope.stamp(establishment.tenant_id)?;

        // The owner lookup and the insert are one statement, so an owner from
        // another tenant inserts nothing.
        let created = sqlx::query_as(&format!(
            "INSERT INTO establishments (tenant_id, owner_id, name, description) \
             SELECT u.tenant_id, u.id, $3, $4 FROM users u \
             WHERE u.id = $2 AND u.tenant_id = $1 \
             RETURNING {ESTABLISHMENT_COLUMNS}"
        ))
        .bind(&tenant_id)
        .bind(establishment.owner_id)
        .bind(&establishment.name)
        .bind(&establishment.description)
        .fetch_optional(self.pool)
        .await
        .map_err(map_unique_violation)?;

        created.ok_or(RepositoryError::NotFound)
    }

    /// Get an establishment by id within the scope.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        scope: &TenantScope,
        id: EstablishmentId,
    ) -> Result<Option<Establishment>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query
            .push(ESTABLISHMENT_COLUMNS)
            .push(" FROM establishments WHERE id = ")
            .push_bind(id);
        constrain(&mut query, scope, "tenant_id");
        Ok(query.build_query_as().fetch_optional(self.pool).await?)
    }

    /// List the staff member ids of an establishment within the scope.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn staff_ids(
        &self,
        scope: &TenantScope,
        id: EstablishmentId,
    ) -> Result<Vec<UserId>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT s.user_id FROM establishment_staff s \
             JOIN establishments e ON e.id = s.establishment_id WHERE e.id = ",
        );
        query.push_bind(id);
        constrain(&mut query, scope, "e.tenant_id");
        query.push(" ORDER BY s.user_id");
        Ok(query.build_query_scalar().fetch_all(self.pool).await?)
    }

    /// Add a staff member; repeated adds are ignored.
    ///
    /// Both the establishment and the user must be visible in the scope.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if either side is out of scope.
    pub async fn add_staff(
        &self,
        scope: &TenantScope,
        id: EstablishmentId,
        user: UserId,
    ) -> Result<(), RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(
            "INSERT INTO establishment_staff (establishment_id, user_id) \
             SELECT e.id, u.id FROM establishments e \
             JOIN users u ON u.tenant_id = e.tenant_id \
             WHERE e.id = ",
        );
        query.push_bind(id).push(" AND u.id = ").push_bind(user);
        constrain(&mut query, scope, "e.tenant_id");
        query.push(" ON CONFLICT (establishment_id, user_id) DO NOTHING RETURNING user_id");

        let inserted: Option<UserId> = query
            .build_query_scalar()
            .fetch_optional(self.pool)
            .await?;
        if inserted.is_some() {
            return Ok(());
        }

        // Nothing inserted: either already a member or out of scope.
        let mut exists = QueryBuilder::<Postgres>::new(
            "SELECT EXISTS (SELECT 1 FROM establishment_staff s \
             JOIN establishments e ON e.id = s.establishment_id \
             WHERE s.establishment_id = ",
        );
        exists.push_bind(id).push(" AND s.user_id = ").push_bind(user);
        constrain(&mut exists, scope, "e.tenant_id");
        exists.push(")");

        let already_member: bool = exists.build_query_scalar().fetch_one(self.pool).await?;
        if already_member {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}
