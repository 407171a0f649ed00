//! Domain models for the web application.
//!
//! Row types derive `sqlx::FromRow` directly; the core newtypes carry their
//! own Postgres encode/decode impls.

pub mod establishment;
pub mod session;
pub mod tenant;
pub mod user;

pub use establishment::{Establishment, NewEstablishment};
pub use session::{CurrentUser, Flash, FlashKind, keys as session_keys};
pub use tenant::{Domain, Tenant};
pub use user::{NewUser, User};
