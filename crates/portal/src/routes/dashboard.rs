//! Dashboard counters.

use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;

use crate::error::AppError;
use crate::middleware::RequireStaff;
use crate::models::DashboardStats;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard/stats", get(stats))
}

/// # Errors
///
/// Returns 403 without `dashboard:view`.
pub async fn stats(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    let today = Utc::now().date_naive();
    Ok(Json(state.dashboard().stats(&staff, today).await?))
}
