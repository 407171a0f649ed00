//! SQL rendering of a [`TenantScope`].

use sqlx::{Postgres, QueryBuilder};

use stylecore_core::TenantScope;

/// Append the tenant predicate for `scope` to a query that already has a
/// `WHERE` clause.
///
/// Under `TenantScope::Tenant` this pushes `AND {column} = $n`; under
/// `TenantScope::Platform` nothing is added.
pub fn constrain(builder: &mut QueryBuilder<'_, Postgres>, scope: &TenantScope, column: &str) {
    if let Some(tenant_id) = scope.tenant_id() {
        builder
            .push(" AND ")
            .push(column)
            .push(" = ")
            .push_bind(tenant_id.clone());
    }
}

#[cfg(test)]
mod tests {
    use stylecore_core::TenantId;

    use super::*;

    #[test]
    fn tenant_scope_appends_predicate() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM users WHERE id = ");
        builder.push_bind(1_i32);
        constrain(
            &mut builder,
            &TenantScope::Tenant(TenantId::new("acme-salon")),
            "tenant_id",
        );
        assert_eq!(
            builder.sql(),
            "SELECT id FROM users WHERE id = $1 AND tenant_id = $2"
        );
    }

    #[test]
    fn platform_scope_leaves_query_untouched() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM users WHERE TRUE");
        constrain(&mut builder, &TenantScope::Platform, "tenant_id");
        assert_eq!(builder.sql(), "SELECT id FROM users WHERE TRUE");
    }
}
