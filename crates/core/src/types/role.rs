//! Staff roles.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a role name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct ParseRoleError(pub String);

/// Role assigned to a user of the salon portal.
///
/// Each user holds exactly one role. Capabilities per role are defined by the
/// static table in [`crate::types::permission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "salon.app_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Owns the salon. Full access, including finance and settings.
    Owner,
    /// Runs the floor: staff, schedules, stock, and reports.
    Manager,
    /// Stylists and therapists working their own book.
    Staff,
    /// Front desk: bookings and client records.
    Receptionist,
}

/// Display information for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleInfo {
    /// Human-readable name.
    pub label: &'static str,
    /// One-line summary of what the role can do.
    pub description: &'static str,
    /// Badge colour used by clients when rendering the role.
    pub color: &'static str,
}

impl Role {
    /// Every role, most privileged first.
    pub const ALL: [Self; 4] = [Self::Owner, Self::Manager, Self::Receptionist, Self::Staff];

    /// Stable snake_case name, matching the database enum.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Manager => "manager",
            Self::Staff => "staff",
            Self::Receptionist => "receptionist",
        }
    }

    /// Display information for this role.
    #[must_use]
    pub const fn info(self) -> RoleInfo {
        match self {
            Self::Owner => RoleInfo {
                label: "Owner",
                description: "Full access to every area of the salon, including finance and settings.",
                color: "purple",
            },
            Self::Manager => RoleInfo {
                label: "Manager",
                description: "Manages staff, schedules, inventory, and day-to-day operations.",
                color: "blue",
            },
            Self::Staff => RoleInfo {
                label: "Staff",
                description: "Views and manages their own appointments and time off.",
                color: "green",
            },
            Self::Receptionist => RoleInfo {
                label: "Receptionist",
                description: "Books appointments and maintains client records.",
                color: "orange",
            },
        }
    }

    /// Whether this role is manager or owner.
    #[must_use]
    pub const fn is_manager_or_above(self) -> bool {
        matches!(self, Self::Owner | Self::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "manager" => Ok(Self::Manager),
            "staff" => Ok(Self::Staff),
            "receptionist" => Ok(Self::Receptionist),
            _ => Err(ParseRoleError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_name_roundtrip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
            assert_eq!(
                serde_json::to_string(&role).unwrap(),
                format!("\"{}\"", role.as_str())
            );
        }
    }

    #[test]
    fn test_unknown_role() {
        assert_eq!(
            "admin".parse::<Role>(),
            Err(ParseRoleError("admin".to_string()))
        );
    }

    #[test]
    fn test_manager_or_above() {
        assert!(Role::Owner.is_manager_or_above());
        assert!(Role::Manager.is_manager_or_above());
        assert!(!Role::Receptionist.is_manager_or_above());
        assert!(!Role::Staff.is_manager_or_above());
    }

    #[test]
    fn test_info_labels() {
        assert_eq!(Role::Receptionist.info().label, "Receptionist");
        assert!(Role::Staff.info().description.contains("their own"));
    }
}
