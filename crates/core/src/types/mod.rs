//! Core types for the salon portal.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod permission;
pub mod price;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use permission::{
    Action, ActionSet, ParseActionError, ParseAreaError, PermissionArea, accessible_areas,
    actions_for, has_permission, has_permission_named,
};
pub use price::{Price, PriceError};
pub use role::{ParseRoleError, Role, RoleInfo};
pub use status::*;
