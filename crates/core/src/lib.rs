//! StyleCore Core - Shared domain types.
//!
//! This crate provides the types shared by every StyleCore component:
//! - `web` - Multi-tenant salon web application
//! - `cli` - Command-line tools for tenant provisioning and migrations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Tenant isolation rules, the `register_as` role
//! mapping and slug generation live here so they can be tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, emails, tenant scopes, roles and OAuth providers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
