//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password login and credential helpers
//! - `registration` - Validated sign-up with the `register_as` role mapping
//! - `oauth` - Provider clients and find/link/create reconciliation
//! - `verification` - Signed email verification links
//! - `email` - Outgoing mail (SMTP or log)
//! - `events` - Domain events and their listeners
//! - `policy` - Establishment access rules

pub mod auth;
pub mod email;
pub mod events;
pub mod oauth;
pub mod policy;
pub mod registration;
pub mod verification;
