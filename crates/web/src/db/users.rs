//! User repository for `PostgreSQL`.
//!
//! Queries are built at runtime with [`QueryBuilder`] so the tenant predicate
//! from [`constrain`] can be appended uniformly.

use sqlx::{PgPool, Postgres, QueryBuilder};

use stylecore_core::{Email, OAuthProvider, TenantScope, UserId, UserStatus};

use super::scope::constrain;
use super::{RepositoryError, map_unique_violation};
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, tenant_id, name, username, email, phone, role, type, status, \
     email_verified_at, google_id, facebook_id, avatar, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    fn select(scope: &TenantScope) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new("SELECT ");
        builder.push(USER_COLUMNS).push(" FROM users WHERE TRUE");
        constrain(&mut builder, scope, "tenant_id");
        builder
    }

    /// Create a user together with its password row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Scope` if the tenant cannot be stamped.
    /// Returns `RepositoryError::Conflict` naming the field of a unique violation.
    pub async fn create(&self, scope: &TenantScope, user: NewUser) -> Result<User, RepositoryError> {
        let tenant_id = scope.stamp(user.tenant_id)?;
        let mut tx = self.pool.begin().await?;

        let mut insert = QueryBuilder::<Postgres>::new(
            "INSERT INTO users (tenant_id, name, username, email, phone, role, type, status, \
             email_verified_at, google_id, facebook_id, avatar) ",
        );
        insert.push_values(std::iter::once(()), |mut row, ()| {
            row.push_bind(tenant_id.clone())
                .push_bind(user.name.clone())
                .push_bind(user.username.clone())
                .push_bind(user.email.clone())
                .push_bind(user.phone.clone())
                .push_bind(user.role)
                .push_bind(user.user_type)
                .push_bind(user.status)
                .push_bind(user.email_verified_at)
                .push_bind(user.google_id.clone())
                .push_bind(user.facebook_id.clone())
                .push_bind(user.avatar.clone());
        });
        insert.push(" RETURNING ").push(USER_COLUMNS);

        let created: User = insert
            .build_query_as()
            .fetch_one(&mut *tx)
            .await
            .map_err(map_unique_violation)?;

        sqlx::query("INSERT INTO user_password (user_id, password_hash) VALUES ($1, $2)")
            .bind(created.id)
            .bind(&user.password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<Option<User>, RepositoryError> {
        let mut query = Self::select(scope);
        query.push(" AND id = ").push_bind(id);
        Ok(query.build_query_as().fetch_optional(self.pool).await?)
    }

    /// Get a user by email within the scope.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(
        &self,
        scope: &TenantScope,
        email: &Email,
    ) -> Result<Option<User>, RepositoryError> {
        let mut query = Self::select(scope);
        query.push(" AND email = ").push_bind(email.clone());
        query.push(" ORDER BY id LIMIT 1");
        Ok(query.build_query_as().fetch_optional(self.pool).await?)
    }

    /// Get a user by a provider's subject id within the scope.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_provider(
        &self,
        scope: &TenantScope,
        provider: OAuthProvider,
        provider_id: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let mut query = Self::select(scope);
        query
            .push(" AND ")
            .push(provider.id_column())
            .push(" = ")
            .push_bind(provider_id.to_owned());
        query.push(" ORDER BY id LIMIT 1");
        Ok(query.build_query_as().fetch_optional(self.pool).await?)
    }

    /// Check whether a username is taken in any tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Get the password hash of a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<Option<String>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT p.password_hash FROM user_password p \
             JOIN users u ON u.id = p.user_id WHERE u.id = ",
        );
        query.push_bind(id);
        constrain(&mut query, scope, "u.tenant_id");

        let hash: Option<String> = query
            .build_query_scalar()
            .fetch_optional(self.pool)
            .await?;
        Ok(hash)
    }

    /// Link a provider id, backfilling the avatar only when none is stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user is not in scope.
    /// Returns `RepositoryError::Conflict` if another user holds the provider id.
    pub async fn link_provider(
        &self,
        scope: &TenantScope,
        id: UserId,
        provider: OAuthProvider,
        provider_id: &str,
        avatar: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        query
            .push(provider.id_column())
            .push(" = ")
            .push_bind(provider_id.to_owned())
            .push(", avatar = COALESCE(avatar, ")
            .push_bind(avatar.map(str::to_owned))
            .push("), updated_at = NOW() WHERE id = ")
            .push_bind(id);
        constrain(&mut query, scope, "tenant_id");
        query.push(" RETURNING ").push(USER_COLUMNS);

        query
            .build_query_as()
            .fetch_optional(self.pool)
            .await
            .map_err(map_unique_violation)?
            .ok_or(RepositoryError::NotFound)
    }

    /// Record email verification and activate the account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user is not in scope.
    pub async fn mark_email_verified(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<User, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(
            "UPDATE users SET email_verified_at = COALESCE(email_verified_at, NOW()), status = ",
        );
        query
            .push_bind(UserStatus::Active)
            .push(", updated_at = NOW() WHERE id = ")
            .push_bind(id);
        constrain(&mut query, scope, "tenant_id");
        query.push(" RETURNING ").push(USER_COLUMNS);

        query
            .build_query_as()
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Move a user to `active` status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user is not in scope.
    pub async fn activate(&self, scope: &TenantScope, id: UserId) -> Result<User, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE users SET status = ");
        query
            .push_bind(UserStatus::Active)
            .push(", updated_at = NOW() WHERE id = ")
            .push_bind(id);
        constrain(&mut query, scope, "tenant_id");
        query.push(" RETURNING ").push(USER_COLUMNS);

        query
            .build_query_as()
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
