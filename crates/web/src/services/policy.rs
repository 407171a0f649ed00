//! Establishment access rules.
//!
//! Pure functions over already-loaded rows. Callers load the establishment
//! and its staff under the request's tenant scope first, so a row from
//! another tenant never reaches these checks; the tenant comparison here is
//! a second line.

use stylecore_core::{TenantScoped, UserId, UserRole};

use crate::models::{Establishment, User};

/// Who may do what with an establishment.
pub struct EstablishmentPolicy;

impl EstablishmentPolicy {
    /// Only owners open establishments.
    #[must_use]
    pub fn create(user: &User) -> bool {
        user.role == UserRole::Owner
    }

    /// The owner, its staff, and managers of the same tenant.
    #[must_use]
    pub fn view(user: &User, establishment: &Establishment, staff: &[UserId]) -> bool {
        if user.tenant_id() != establishment.tenant_id() {
            return false;
        }
        establishment.owner_id == user.id
            || staff.contains(&user.id)
            || user.role == UserRole::Manager
    }

    /// Only the owner changes an establishment or its staff.
    #[must_use]
    pub fn update(user: &User, establishment: &Establishment) -> bool {
        user.tenant_id() == establishment.tenant_id() && establishment.owner_id == user.id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use stylecore_core::{Email, EstablishmentId, TenantId, UserStatus};

    use super::*;

    fn user(id: i32, tenant: &str, role: UserRole) -> User {
        User {
            id: UserId::new(id),
            tenant_id: TenantId::new(tenant),
            name: format!("user {id}"),
            username: format!("user{id}"),
            email: Email::parse(&format!("user{id}@mail.com")).unwrap(),
            phone: None,
            role,
            user_type: role.user_type(),
            status: UserStatus::Active,
            email_verified_at: None,
            google_id: None,
            facebook_id: None,
            avatar: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn salon(owner: i32, tenant: &str) -> Establishment {
        Establishment {
            id: EstablishmentId::new(1),
            tenant_id: TenantId::new(tenant),
            owner_id: UserId::new(owner),
            name: "Downtown".to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_owners_create() {
        assert!(EstablishmentPolicy::create(&user(1, "acme", UserRole::Owner)));
        assert!(!EstablishmentPolicy::create(&user(1, "acme", UserRole::Manager)));
        assert!(!EstablishmentPolicy::create(&user(1, "acme", UserRole::Customer)));
    }

    #[test]
    fn owner_staff_and_manager_may_view() {
        let salon = salon(1, "acme");
        let staff = [UserId::new(2)];

        assert!(EstablishmentPolicy::view(&user(1, "acme", UserRole::Owner), &salon, &staff));
        assert!(EstablishmentPolicy::view(&user(2, "acme", UserRole::Staff), &salon, &staff));
        assert!(EstablishmentPolicy::view(&user(3, "acme", UserRole::Manager), &salon, &staff));
        assert!(!EstablishmentPolicy::view(&user(4, "acme", UserRole::Customer), &salon, &staff));
        assert!(!EstablishmentPolicy::view(&user(5, "acme", UserRole::Owner), &salon, &staff));
    }

    #[test]
    fn other_tenant_is_always_denied() {
        let salon = salon(1, "acme");
        let manager = user(3, "rival", UserRole::Manager);
        assert!(!EstablishmentPolicy::view(&manager, &salon, &[]));

        let impostor = user(1, "rival", UserRole::Owner);
        assert!(!EstablishmentPolicy::update(&impostor, &salon));
    }

    #[test]
    fn only_owner_updates() {
        let salon = salon(1, "acme");
        assert!(EstablishmentPolicy::update(&user(1, "acme", UserRole::Owner), &salon));
        assert!(!EstablishmentPolicy::update(&user(3, "acme", UserRole::Manager), &salon));
    }
}
