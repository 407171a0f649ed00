//! User roles, account types and lifecycle statuses.
//!
//! A user's `role` and `type` are derived once, at creation time, from the
//! intent they registered with:
//!
//! ```text
//! register_as      role         type
//! ─────────────    ──────────   ─────────────
//! establishment →  owner     →  establishment
//! professional  →  freelancer → professional
//! (anything)    →  customer  →  client
//! ```
//!
//! Both steps are exhaustive matches, so adding a variant fails to compile
//! until the table is extended.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The intent a user declares when signing up.
///
/// Unknown or missing intents fall back to [`RegisterAs::Customer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegisterAs {
    /// A salon client booking services.
    #[default]
    Customer,
    /// An independent professional (freelancer).
    Professional,
    /// A salon owner registering an establishment.
    Establishment,
}

impl RegisterAs {
    /// Interpret a raw `register_as` value from a form.
    ///
    /// Matching is case-insensitive; anything unrecognised is a customer.
    #[must_use]
    pub fn from_intent(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("establishment") => Self::Establishment,
            Some("professional") => Self::Professional,
            _ => Self::Customer,
        }
    }

    /// The role granted for this intent.
    #[must_use]
    pub const fn role(self) -> UserRole {
        match self {
            Self::Establishment => UserRole::Owner,
            Self::Professional => UserRole::Freelancer,
            Self::Customer => UserRole::Customer,
        }
    }

    /// The `(role, type)` pair stored on a new user.
    #[must_use]
    pub const fn classify(self) -> (UserRole, UserType) {
        let role = self.role();
        (role, role.user_type())
    }
}

/// Permission role of a user inside a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Books services.
    Customer,
    /// Works for an establishment.
    Staff,
    /// Independent professional.
    Freelancer,
    /// Owns one or more establishments.
    Owner,
    /// Manages establishments on behalf of the tenant.
    Manager,
}

impl UserRole {
    /// The account type implied by this role.
    #[must_use]
    pub const fn user_type(self) -> UserType {
        match self {
            Self::Owner | Self::Manager => UserType::Establishment,
            Self::Freelancer | Self::Staff => UserType::Professional,
            Self::Customer => UserType::Client,
        }
    }

    /// The stored spelling of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
            Self::Freelancer => "freelancer",
            Self::Owner => "owner",
            Self::Manager => "manager",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "staff" => Ok(Self::Staff),
            "freelancer" => Ok(Self::Freelancer),
            "owner" => Ok(Self::Owner),
            "manager" => Ok(Self::Manager),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Kind of account, used for onboarding and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Client,
    Professional,
    Establishment,
}

impl UserType {
    /// The stored spelling of this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Professional => "professional",
            Self::Establishment => "establishment",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account lifecycle status.
///
/// Registered users start `Pending` and become `Active` once their email is
/// verified. OAuth sign-ups start `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Pending,
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    /// Whether the account may sign in.
    #[must_use]
    pub const fn can_sign_in(self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }

    /// The stored spelling of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn establishment_maps_to_owner_and_establishment() {
        assert_eq!(
            RegisterAs::from_intent(Some("establishment")).classify(),
            (UserRole::Owner, UserType::Establishment)
        );
    }

    #[test]
    fn professional_maps_to_freelancer_and_professional() {
        assert_eq!(
            RegisterAs::from_intent(Some("professional")).classify(),
            (UserRole::Freelancer, UserType::Professional)
        );
    }

    #[test]
    fn anything_else_maps_to_customer_and_client() {
        for raw in [None, Some(""), Some("customer"), Some("admin"), Some("owner")] {
            assert_eq!(
                RegisterAs::from_intent(raw).classify(),
                (UserRole::Customer, UserType::Client),
                "intent {raw:?}"
            );
        }
    }

    #[test]
    fn intent_matching_ignores_case_and_padding() {
        assert_eq!(
            RegisterAs::from_intent(Some("  Establishment ")),
            RegisterAs::Establishment
        );
    }

    #[test]
    fn every_role_has_a_type() {
        assert_eq!(UserRole::Staff.user_type(), UserType::Professional);
        assert_eq!(UserRole::Manager.user_type(), UserType::Establishment);
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [
            UserRole::Customer,
            UserRole::Staff,
            UserRole::Freelancer,
            UserRole::Owner,
            UserRole::Manager,
        ] {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(role));
        }
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn only_pending_and_active_can_sign_in() {
        assert!(UserStatus::Pending.can_sign_in());
        assert!(UserStatus::Active.can_sign_in());
        assert!(!UserStatus::Suspended.can_sign_in());
        assert!(!UserStatus::Inactive.can_sign_in());
    }
}
