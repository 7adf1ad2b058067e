//! Time-off API handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use chrono::Utc;
use serde::Deserialize;

use salon_core::TimeOffRequestId;

use crate::error::AppError;
use crate::middleware::RequireStaff;
use crate::models::{NewTimeOffRequest, TimeOffDecision, TimeOffRequest};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/time-off", get(list).post(submit))
        .route("/api/time-off/{id}", patch(review))
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub decision: TimeOffDecision,
}

/// # Errors
///
/// Returns 403 without `time_off_requests:view`.
pub async fn list(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<TimeOffRequest>>, AppError> {
    Ok(Json(state.time_off().list(&staff).await?))
}

/// Submit a request for the caller.
///
/// # Errors
///
/// Returns 422 for a bad date range or a login with no staff record.
pub async fn submit(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<NewTimeOffRequest>,
) -> Result<(StatusCode, Json<TimeOffRequest>), AppError> {
    let today = Utc::now().date_naive();
    let request = state.time_off().submit(&staff, input, today).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Approve or reject a pending request.
///
/// # Errors
///
/// Returns 404 for an unknown id and 422 if it was already reviewed.
pub async fn review(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<TimeOffRequestId>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<TimeOffRequest>, AppError> {
    Ok(Json(state.time_off().review(&staff, id, body.decision).await?))
}
