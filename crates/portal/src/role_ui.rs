//! Role-based UI capabilities.
//!
//! Clients render whatever this table says: which sections appear in the
//! navigation, which widgets sit on the dashboard, and which quick actions
//! are offered. Nothing here knows how those are drawn.

use serde::Serialize;

use salon_core::{Action, PermissionArea, Role, RoleInfo};

use crate::permissions::Permissions;

/// A navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub area: PermissionArea,
    pub title: &'static str,
    pub path: &'static str,
}

const fn nav_item(area: PermissionArea) -> NavItem {
    use PermissionArea as A;

    let (title, path) = match area {
        A::Dashboard => ("Dashboard", "/dashboard"),
        A::Appointments => ("Appointments", "/appointments"),
        A::Clients => ("Clients", "/clients"),
        A::StaffManagement => ("Staff", "/staff"),
        A::ScheduleManagement => ("Schedules", "/schedules"),
        A::TimeOffRequests => ("Time Off", "/time-off"),
        A::Services => ("Services", "/services"),
        A::Products => ("Products", "/products"),
        A::Inventory => ("Inventory", "/inventory"),
        A::Reports => ("Reports", "/reports"),
        A::Finance => ("Finance", "/finance"),
        A::Settings => ("Settings", "/settings"),
    };
    NavItem { area, title, path }
}

/// A dashboard panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardWidget {
    TodaysAppointments,
    UpcomingAppointments,
    MySchedule,
    ClientCount,
    PendingTimeOff,
    MyTimeOff,
    StaffOverview,
    Revenue,
    LowStock,
}

impl DashboardWidget {
    /// Area whose `view` permission the widget needs.
    #[must_use]
    pub const fn area(self) -> PermissionArea {
        match self {
            Self::TodaysAppointments | Self::UpcomingAppointments | Self::MySchedule => {
                PermissionArea::Appointments
            }
            Self::ClientCount => PermissionArea::Clients,
            Self::PendingTimeOff | Self::MyTimeOff => PermissionArea::TimeOffRequests,
            Self::StaffOverview => PermissionArea::StaffManagement,
            Self::Revenue => PermissionArea::Finance,
            Self::LowStock => PermissionArea::Inventory,
        }
    }
}

/// Widgets a role's dashboard shows, in display order.
#[must_use]
pub const fn dashboard_widgets(role: Role) -> &'static [DashboardWidget] {
    use DashboardWidget as W;

    match role {
        Role::Owner => &[
            W::TodaysAppointments,
            W::Revenue,
            W::ClientCount,
            W::PendingTimeOff,
            W::StaffOverview,
            W::LowStock,
        ],
        Role::Manager => &[
            W::TodaysAppointments,
            W::UpcomingAppointments,
            W::PendingTimeOff,
            W::StaffOverview,
            W::LowStock,
        ],
        Role::Receptionist => &[W::TodaysAppointments, W::UpcomingAppointments, W::ClientCount],
        Role::Staff => &[W::MySchedule, W::MyTimeOff],
    }
}

/// A shortcut button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    BookAppointment,
    AddClient,
    RequestTimeOff,
    ReviewTimeOff,
}

impl QuickAction {
    const ALL: [Self; 4] = [
        Self::BookAppointment,
        Self::AddClient,
        Self::RequestTimeOff,
        Self::ReviewTimeOff,
    ];

    /// Permission the action needs.
    #[must_use]
    pub const fn requires(self) -> (PermissionArea, Action) {
        match self {
            Self::BookAppointment => (PermissionArea::Appointments, Action::Create),
            Self::AddClient => (PermissionArea::Clients, Action::Create),
            Self::RequestTimeOff => (PermissionArea::TimeOffRequests, Action::Create),
            Self::ReviewTimeOff => (PermissionArea::TimeOffRequests, Action::Edit),
        }
    }
}

/// Everything a client needs to lay out the portal for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleBasedUi {
    pub role: Option<Role>,
    pub role_info: Option<RoleInfo>,
    pub role_loading: bool,
    pub nav: Vec<NavItem>,
    pub widgets: Vec<DashboardWidget>,
    pub quick_actions: Vec<QuickAction>,
}

impl RoleBasedUi {
    /// Build the layout for `permissions`.
    ///
    /// While the role is loading, or when none is assigned, everything is
    /// empty.
    #[must_use]
    pub fn for_permissions(permissions: &Permissions) -> Self {
        let Some(role) = permissions.role() else {
            return Self {
                role: None,
                role_info: None,
                role_loading: permissions.role_loading(),
                nav: Vec::new(),
                widgets: Vec::new(),
                quick_actions: Vec::new(),
            };
        };

        let nav = permissions
            .accessible_areas()
            .into_iter()
            .map(nav_item)
            .collect();
        let widgets = dashboard_widgets(role)
            .iter()
            .copied()
            .filter(|w| permissions.can_view(w.area()))
            .collect();
        let quick_actions = QuickAction::ALL
            .into_iter()
            .filter(|a| {
                let (area, action) = a.requires();
                permissions.has_permission(area, action)
            })
            .collect();

        Self {
            role: Some(role),
            role_info: Some(role.info()),
            role_loading: false,
            nav,
            widgets,
            quick_actions,
        }
    }

    /// Whether `area` appears in the navigation.
    #[must_use]
    pub fn shows(&self, area: PermissionArea) -> bool {
        self.nav.iter().any(|item| item.area == area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_shows_nothing() {
        let ui = RoleBasedUi::for_permissions(&Permissions::loading());
        assert!(ui.role_loading);
        assert!(ui.nav.is_empty());
        assert!(ui.widgets.is_empty());
        assert!(ui.quick_actions.is_empty());
    }

    #[test]
    fn test_staff_layout() {
        let ui = RoleBasedUi::for_permissions(&Permissions::for_role(Role::Staff));
        assert!(ui.shows(PermissionArea::Appointments));
        assert!(ui.shows(PermissionArea::TimeOffRequests));
        assert!(!ui.shows(PermissionArea::Inventory));
        assert!(!ui.shows(PermissionArea::Finance));
        assert_eq!(ui.widgets, vec![DashboardWidget::MySchedule, DashboardWidget::MyTimeOff]);
        assert!(ui.quick_actions.contains(&QuickAction::RequestTimeOff));
        assert!(!ui.quick_actions.contains(&QuickAction::ReviewTimeOff));
    }

    #[test]
    fn test_owner_sees_everything() {
        let ui = RoleBasedUi::for_permissions(&Permissions::for_role(Role::Owner));
        assert_eq!(ui.nav.len(), PermissionArea::ALL.len());
        assert_eq!(ui.quick_actions.len(), QuickAction::ALL.len());
        assert_eq!(ui.role_info.map(|info| info.label), Some("Owner"));
    }

    #[test]
    fn test_widgets_never_exceed_permissions() {
        for role in Role::ALL {
            let permissions = Permissions::for_role(role);
            for widget in dashboard_widgets(role) {
                assert!(
                    permissions.can_view(widget.area()),
                    "{role} cannot view {:?}",
                    widget.area()
                );
            }
        }
    }

    #[test]
    fn test_nav_paths_are_unique() {
        let mut paths: Vec<_> = PermissionArea::ALL
            .into_iter()
            .map(|a| nav_item(a).path)
            .collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), PermissionArea::ALL.len());
    }
}
