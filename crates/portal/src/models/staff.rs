//! Staff roster types.

use serde::{Deserialize, Serialize};

use salon_core::{Email, StaffId, UserId};

/// A member of the salon team.
///
/// `user_id` links the roster entry to a login; staff without a login can
/// still be booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub active: bool,
}
