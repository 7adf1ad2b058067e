//! The caller's own profile.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use salon_core::{Email, PermissionArea, StaffId, UserId};

use crate::middleware::RequireStaff;
use crate::role_ui::RoleBasedUi;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/me", get(me))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: UserId,
    pub email: Option<Email>,
    pub staff_id: Option<StaffId>,
    pub accessible_areas: Vec<PermissionArea>,
    #[serde(flatten)]
    pub ui: RoleBasedUi,
}

/// Who the caller is and what their portal should look like.
pub async fn me(RequireStaff(staff): RequireStaff) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: staff.user_id,
        email: staff.email,
        staff_id: staff.staff_id,
        accessible_areas: staff.permissions.accessible_areas(),
        ui: RoleBasedUi::for_permissions(&staff.permissions),
    })
}
