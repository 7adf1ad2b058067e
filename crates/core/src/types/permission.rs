//! Permission areas, actions, and the static role capability table.
//!
//! Permission checks are pure lookups. The table is total: any
//! (role, area, action) it does not grant is denied, and string lookups with
//! unknown names are denied rather than reported as errors.
//!
//! ```
//! use salon_core::{Action, PermissionArea, Role, has_permission};
//!
//! assert!(has_permission(Role::Staff, PermissionArea::Appointments, Action::View));
//! assert!(!has_permission(Role::Staff, PermissionArea::Inventory, Action::View));
//! ```

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::role::Role;

/// Error returned when a permission area name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid permission area: {0}")]
pub struct ParseAreaError(pub String);

/// Error returned when an action name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid action: {0}")]
pub struct ParseActionError(pub String);

/// A resource category subject to access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionArea {
    Appointments,
    Clients,
    StaffManagement,
    Services,
    Inventory,
    Reports,
    Settings,
    ScheduleManagement,
    TimeOffRequests,
    Finance,
    Products,
    Dashboard,
}

impl PermissionArea {
    /// Every area, in navigation order.
    pub const ALL: [Self; 12] = [
        Self::Dashboard,
        Self::Appointments,
        Self::Clients,
        Self::StaffManagement,
        Self::ScheduleManagement,
        Self::TimeOffRequests,
        Self::Services,
        Self::Products,
        Self::Inventory,
        Self::Reports,
        Self::Finance,
        Self::Settings,
    ];

    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Appointments => "appointments",
            Self::Clients => "clients",
            Self::StaffManagement => "staff_management",
            Self::Services => "services",
            Self::Inventory => "inventory",
            Self::Reports => "reports",
            Self::Settings => "settings",
            Self::ScheduleManagement => "schedule_management",
            Self::TimeOffRequests => "time_off_requests",
            Self::Finance => "finance",
            Self::Products => "products",
            Self::Dashboard => "dashboard",
        }
    }

    /// Human-readable name used in access-denied notices.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Appointments => "appointments",
            Self::Clients => "clients",
            Self::StaffManagement => "staff management",
            Self::Services => "services",
            Self::Inventory => "inventory",
            Self::Reports => "reports",
            Self::Settings => "settings",
            Self::ScheduleManagement => "schedule management",
            Self::TimeOffRequests => "time off requests",
            Self::Finance => "finance",
            Self::Products => "products",
            Self::Dashboard => "the dashboard",
        }
    }
}

impl fmt::Display for PermissionArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionArea {
    type Err = ParseAreaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|area| area.as_str() == s)
            .ok_or_else(|| ParseAreaError(s.to_owned()))
    }
}

/// An operation on a permission area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    /// Every action.
    pub const ALL: [Self; 4] = [Self::View, Self::Create, Self::Edit, Self::Delete];

    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::View => 0b0001,
            Self::Create => 0b0010,
            Self::Edit => 0b0100,
            Self::Delete => 0b1000,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ParseActionError(s.to_owned()))
    }
}

/// A set of [`Action`]s granted on one area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ActionSet(u8);

impl ActionSet {
    pub const NONE: Self = Self(0);
    pub const VIEW: Self = Self(Action::View.bit());
    pub const ALL: Self = Self(0b1111);
    /// View, create, and edit; no delete.
    pub const MANAGE: Self = Self(0b0111);
    /// View and create.
    pub const SUBMIT: Self = Self(0b0011);

    /// Whether the set grants `action`.
    #[must_use]
    pub const fn contains(self, action: Action) -> bool {
        self.0 & action.bit() != 0
    }

    /// Whether the set grants nothing.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The granted actions, in [`Action::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = Action> {
        Action::ALL.into_iter().filter(move |a| self.contains(*a))
    }
}

impl Serialize for ActionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Actions `role` may perform on `area`.
///
/// This is the capability table. Anything not listed is [`ActionSet::NONE`].
#[must_use]
pub const fn actions_for(role: Role, area: PermissionArea) -> ActionSet {
    use PermissionArea as A;

    match role {
        Role::Owner => ActionSet::ALL,
        Role::Manager => match area {
            A::Appointments
            | A::Clients
            | A::Services
            | A::Inventory
            | A::ScheduleManagement
            | A::Products => ActionSet::ALL,
            A::StaffManagement | A::TimeOffRequests => ActionSet::MANAGE,
            A::Reports | A::Settings | A::Finance | A::Dashboard => ActionSet::VIEW,
        },
        Role::Receptionist => match area {
            A::Appointments => ActionSet::ALL,
            A::Clients => ActionSet::MANAGE,
            A::TimeOffRequests => ActionSet::SUBMIT,
            A::Services | A::Products | A::ScheduleManagement | A::Dashboard => ActionSet::VIEW,
            A::StaffManagement | A::Inventory | A::Reports | A::Settings | A::Finance => {
                ActionSet::NONE
            }
        },
        Role::Staff => match area {
            A::Appointments => ActionSet::MANAGE,
            A::TimeOffRequests => ActionSet::SUBMIT,
            A::Clients | A::Services | A::Products | A::ScheduleManagement | A::Dashboard => {
                ActionSet::VIEW
            }
            A::StaffManagement | A::Inventory | A::Reports | A::Settings | A::Finance => {
                ActionSet::NONE
            }
        },
    }
}

/// Whether `role` may perform `action` on `area`.
#[must_use]
pub const fn has_permission(role: Role, area: PermissionArea, action: Action) -> bool {
    actions_for(role, area).contains(action)
}

/// String form of [`has_permission`]; unknown names are denied.
#[must_use]
pub fn has_permission_named(role: &str, area: &str, action: &str) -> bool {
    match (
        role.parse::<Role>(),
        area.parse::<PermissionArea>(),
        action.parse::<Action>(),
    ) {
        (Ok(role), Ok(area), Ok(action)) => has_permission(role, area, action),
        _ => false,
    }
}

/// Areas where `role` holds at least one action, in navigation order.
#[must_use]
pub fn accessible_areas(role: Role) -> Vec<PermissionArea> {
    PermissionArea::ALL
        .into_iter()
        .filter(|area| !actions_for(role, *area).is_empty())
        .collect()
}
