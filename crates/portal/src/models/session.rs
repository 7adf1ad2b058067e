//! Request-scoped identity for authenticated portal users.

use serde::Serialize;

use salon_core::{Email, StaffId, UserId};

use crate::permissions::Permissions;

/// The authenticated caller of a portal API request.
///
/// Built by the auth extractor from the bearer token and the caller's
/// `user_roles` row.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentStaff {
    /// Hosted auth user id.
    pub user_id: UserId,
    /// Login email.
    pub email: Option<Email>,
    /// Roster entry linked to this login, if any.
    pub staff_id: Option<StaffId>,
    /// Resolved permissions.
    #[serde(skip)]
    pub permissions: Permissions,
}
