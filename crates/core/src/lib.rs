//! Salon Core - Shared domain types.
//!
//! This crate provides the types used across all salon components:
//! - `portal` - HTTP API and client library (retry, permissions, realtime sync)
//! - `cli` - Command-line tools for migrations, role administration, and staff login
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The permission matrix lives here because it is a
//! static table that every other component consults.
//!
//! # Modules
//!
//! - [`types`] - Roles, permission areas and actions, the permission matrix,
//!   type-safe IDs, statuses, emails, and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
