//! Establishments (salons inside a tenant) and their staff.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stylecore_core::{EstablishmentId, TenantId, TenantScoped, UserId};

/// A salon location owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Establishment {
    pub id: EstablishmentId,
    pub tenant_id: TenantId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantScoped for Establishment {
    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

#[derive(Debug, Clone)]
pub struct NewEstablishment {
    pub tenant_id: Option<TenantId>,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
}
