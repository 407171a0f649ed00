//! Core types for StyleCore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod oauth;
pub mod role;
pub mod slug;
pub mod tenant;

pub use email::{Email, EmailError};
pub use id::*;
pub use oauth::{OAuthProvider, UnsupportedProvider};
pub use role::*;
pub use slug::{SlugError, slugify};
pub use tenant::{BlueprintError, ScopeError, TenantBlueprint, TenantId, TenantScope, TenantScoped};
