//! Tenants and the explicit tenant scope threaded through data access.
//!
//! Every tenant-scoped read and write takes a [`TenantScope`]. Request
//! handlers only ever build [`TenantScope::Tenant`]; console code that must
//! see every tenant names [`TenantScope::Platform`] explicitly.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::email::{Email, EmailError};
use super::slug::{SlugError, slugify};

/// Slug identifying a tenant, e.g. `acme-salon`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Wrap an existing tenant key (as read from storage or a session).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a tenant key from a display name.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError`] if the name has no letters or digits.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        slugify(name).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for TenantId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TenantId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        <String as sqlx::Decode<sqlx::Postgres>>::decode(value).map(Self)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for TenantId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Errors raised when stamping a new row with its tenant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// Platform scope with no explicit tenant on the row.
    #[error("no tenant given for a tenant-scoped row")]
    MissingTenant,
    /// The row names a tenant other than the active one.
    #[error("row belongs to tenant '{row}' but the active tenant is '{active}'")]
    CrossTenant { active: TenantId, row: TenantId },
}

/// The tenant context a data operation runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantScope {
    /// Restrict to a single tenant.
    Tenant(TenantId),
    /// Unrestricted, for platform administration.
    Platform,
}

impl TenantScope {
    /// The tenant this scope is restricted to, if any.
    #[must_use]
    pub const fn tenant_id(&self) -> Option<&TenantId> {
        match self {
            Self::Tenant(id) => Some(id),
            Self::Platform => None,
        }
    }

    /// Whether a row owned by `owner` is visible in this scope.
    #[must_use]
    pub fn admits(&self, owner: &TenantId) -> bool {
        match self {
            Self::Tenant(id) => id == owner,
            Self::Platform => true,
        }
    }

    /// Resolve the tenant id a new row is created with.
    ///
    /// An unset id is filled from the active tenant; an explicit id must
    /// agree with it.
    ///
    /// # Errors
    ///
    /// [`ScopeError::MissingTenant`] under `Platform` without an explicit id,
    /// [`ScopeError::CrossTenant`] when the explicit id names another tenant.
    pub fn stamp(&self, explicit: Option<TenantId>) -> Result<TenantId, ScopeError> {
        match (self, explicit) {
            (Self::Tenant(active), None) => Ok(active.clone()),
            (Self::Tenant(active), Some(row)) if *active == row => Ok(row),
            (Self::Tenant(active), Some(row)) => Err(ScopeError::CrossTenant {
                active: active.clone(),
                row,
            }),
            (Self::Platform, Some(row)) => Ok(row),
            (Self::Platform, None) => Err(ScopeError::MissingTenant),
        }
    }
}

/// Implemented by models stored with a `tenant_id` column.
pub trait TenantScoped {
    fn tenant_id(&self) -> &TenantId;
}

/// Everything needed to provision a tenant from a name and optional email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantBlueprint {
    pub id: TenantId,
    pub name: String,
    pub email: Email,
    pub domain: String,
}

/// Errors building a [`TenantBlueprint`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlueprintError {
    #[error("invalid tenant name: {0}")]
    Name(#[from] SlugError),
    #[error("invalid tenant email: {0}")]
    Email(#[from] EmailError),
}

impl TenantBlueprint {
    /// Suffix of the development domain every new tenant gets.
    pub const DEFAULT_DOMAIN_SUFFIX: &'static str = "localhost";

    /// Plan a tenant named `name`.
    ///
    /// ```
    /// use stylecore_core::TenantBlueprint;
    ///
    /// let plan = TenantBlueprint::new("Acme Salon", None).unwrap();
    /// assert_eq!(plan.id.as_str(), "acme-salon");
    /// assert_eq!(plan.domain, "acme-salon.localhost");
    /// assert_eq!(plan.email.as_str(), "acme-salon@example.com");
    /// ```
    ///
    /// # Errors
    ///
    /// Fails if the name slugifies to nothing or the email is malformed.
    pub fn new(name: &str, email: Option<&str>) -> Result<Self, BlueprintError> {
        let id = TenantId::from_name(name)?;
        let email = match email {
            Some(raw) => Email::parse(raw)?,
            None => Email::parse(&format!("{id}@example.com"))?,
        };
        let domain = format!("{id}.{}", Self::DEFAULT_DOMAIN_SUFFIX);

        Ok(Self {
            name: name.trim().to_owned(),
            id,
            email,
            domain,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn acme() -> TenantId {
        TenantId::new("acme-salon")
    }

    #[test]
    fn tenant_scope_admits_only_its_own_rows() {
        let scope = TenantScope::Tenant(acme());
        assert!(scope.admits(&acme()));
        assert!(!scope.admits(&TenantId::new("other")));
        assert!(TenantScope::Platform.admits(&TenantId::new("other")));
    }

    #[test]
    fn stamp_fills_unset_tenant() {
        let scope = TenantScope::Tenant(acme());
        assert_eq!(scope.stamp(None), Ok(acme()));
        assert_eq!(scope.stamp(Some(acme())), Ok(acme()));
    }

    #[test]
    fn stamp_rejects_cross_tenant_rows() {
        let scope = TenantScope::Tenant(acme());
        assert_eq!(
            scope.stamp(Some(TenantId::new("other"))),
            Err(ScopeError::CrossTenant {
                active: acme(),
                row: TenantId::new("other"),
            })
        );
    }

    #[test]
    fn platform_scope_requires_explicit_tenant() {
        assert_eq!(TenantScope::Platform.stamp(None), Err(ScopeError::MissingTenant));
        assert_eq!(TenantScope::Platform.stamp(Some(acme())), Ok(acme()));
        assert_eq!(TenantScope::Platform.tenant_id(), None);
    }

    #[test]
    fn blueprint_defaults() {
        let plan = TenantBlueprint::new("Acme Salon", None).unwrap();
        assert_eq!(plan.id, acme());
        assert_eq!(plan.name, "Acme Salon");
        assert_eq!(plan.domain, "acme-salon.localhost");
        assert_eq!(plan.email.as_str(), "acme-salon@example.com");
    }

    #[test]
    fn blueprint_uses_given_email() {
        let plan = TenantBlueprint::new("Acme Salon", Some("Owner@Acme.com")).unwrap();
        assert_eq!(plan.email.as_str(), "owner@acme.com");
    }

    #[test]
    fn blueprint_rejects_bad_input() {
        assert!(matches!(
            TenantBlueprint::new("***", None),
            Err(BlueprintError::Name(_))
        ));
        assert!(matches!(
            TenantBlueprint::new("Acme", Some("not-an-email")),
            Err(BlueprintError::Email(_))
        ));
    }
}
