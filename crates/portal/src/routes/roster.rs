//! Staff roster and service menu.

use axum::{Json, Router, extract::State, routing::get};

use crate::error::AppError;
use crate::middleware::RequireStaff;
use crate::models::{SalonService, StaffMember};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/staff", get(staff))
        .route("/api/services", get(services))
}

/// # Errors
///
/// Returns 403 without `schedule_management:view`.
pub async fn staff(
    RequireStaff(caller): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<StaffMember>>, AppError> {
    Ok(Json(state.roster().staff(&caller).await?))
}

/// # Errors
///
/// Returns 403 without `services:view`.
pub async fn services(
    RequireStaff(caller): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<SalonService>>, AppError> {
    Ok(Json(state.roster().services(&caller).await?))
}
