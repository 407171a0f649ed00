//! Tenants and the hostnames that route to them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stylecore_core::{Email, TenantId, TenantScope};

/// A salon business with its own subdomain and isolated data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// The scope every request for this tenant runs under.
    #[must_use]
    pub fn scope(&self) -> TenantScope {
        TenantScope::Tenant(self.id.clone())
    }
}

/// A hostname mapped to a tenant. Hostnames are globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Domain {
    pub domain: String,
    pub tenant_id: TenantId,
}
