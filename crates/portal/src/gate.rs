//! Role gate: decide what a caller gets to see for an (area, action) pair.
//!
//! The gate is a pure function of the caller's [`Permissions`]. Rendering the
//! outcome is up to the consumer; the HTTP layer uses [`RoleGate::authorize`]
//! and turns a denial into `403 Forbidden`.

use std::fmt;

use serde::Serialize;

use salon_core::{Action, PermissionArea};

use crate::error::AppError;
use crate::permissions::Permissions;

/// Notice shown when access is denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessDenied {
    pub area: PermissionArea,
    pub action: Action,
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Access denied: you don't have permission to {} {}.",
            self.action,
            self.area.label()
        )
    }
}

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision<T> {
    /// The role is still loading; show a neutral placeholder.
    Pending,
    /// Access granted; show the gated content.
    Granted(T),
    /// Access denied; show the caller-supplied fallback.
    Fallback(T),
    /// Access denied; show nothing.
    Hidden,
    /// Access denied; show the standard notice.
    Denied(AccessDenied),
}

impl<T> GateDecision<T> {
    /// Whether the gated content is shown.
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    /// The content to show, if any.
    pub fn into_content(self) -> Option<T> {
        match self {
            Self::Granted(content) | Self::Fallback(content) => Some(content),
            Self::Pending | Self::Hidden | Self::Denied(_) => None,
        }
    }
}

/// Guard for one (area, action) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGate {
    area: PermissionArea,
    action: Action,
    hide_when_no_access: bool,
}

impl RoleGate {
    #[must_use]
    pub const fn new(area: PermissionArea, action: Action) -> Self {
        Self {
            area,
            action,
            hide_when_no_access: false,
        }
    }

    /// Gate requiring `view` on `area`.
    #[must_use]
    pub const fn view(area: PermissionArea) -> Self {
        Self::new(area, Action::View)
    }

    /// Render nothing instead of the access-denied notice.
    #[must_use]
    pub const fn hide_when_no_access(mut self) -> Self {
        self.hide_when_no_access = true;
        self
    }

    /// Decide between `children` and `fallback`.
    ///
    /// Content is only built for the branch that is chosen.
    pub fn decide<T, C, F>(
        &self,
        permissions: &Permissions,
        children: C,
        fallback: Option<F>,
    ) -> GateDecision<T>
    where
        C: FnOnce() -> T,
        F: FnOnce() -> T,
    {
        if permissions.role_loading() {
            return GateDecision::Pending;
        }
        if permissions.has_permission(self.area, self.action) {
            return GateDecision::Granted(children());
        }
        if let Some(fallback) = fallback {
            return GateDecision::Fallback(fallback());
        }
        if self.hide_when_no_access {
            GateDecision::Hidden
        } else {
            GateDecision::Denied(self.denied())
        }
    }

    /// [`decide`](Self::decide) without a fallback.
    pub fn render<T, C>(&self, permissions: &Permissions, children: C) -> GateDecision<T>
    where
        C: FnOnce() -> T,
    {
        self.decide(permissions, children, None::<fn() -> T>)
    }

    /// Check access for an API request.
    ///
    /// # Errors
    ///
    /// Returns `AppError::RolePending` while the role is loading and
    /// `AppError::Forbidden` when access is denied.
    pub fn authorize(&self, permissions: &Permissions) -> Result<(), AppError> {
        match self.render(permissions, || ()) {
            GateDecision::Granted(()) => Ok(()),
            GateDecision::Pending => Err(AppError::RolePending),
            GateDecision::Fallback(()) | GateDecision::Hidden | GateDecision::Denied(_) => {
                Err(AppError::Forbidden(self.denied()))
            }
        }
    }

    const fn denied(&self) -> AccessDenied {
        AccessDenied {
            area: self.area,
            action: self.action,
        }
    }
}
