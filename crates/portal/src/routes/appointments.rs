//! Appointment book API handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use salon_core::{AppointmentId, AppointmentStatus};

use crate::error::AppError;
use crate::middleware::RequireStaff;
use crate::models::{Appointment, NewAppointment};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/appointments", get(list).post(create))
        .route("/api/appointments/today", get(today))
        .route("/api/appointments/{id}/status", patch(update_status))
        .route("/api/appointments/{id}", delete(remove))
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: AppointmentStatus,
}

/// Appointments on `?date=` (default today).
///
/// # Errors
///
/// Returns 403 without `appointments:view`.
pub async fn list(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(state.appointments().list_for_day(&staff, date).await?))
}

/// Today's appointments.
///
/// # Errors
///
/// Returns 403 without `appointments:view`.
pub async fn today(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let today = Utc::now().date_naive();
    Ok(Json(state.appointments().today(&staff, today).await?))
}

/// Book an appointment.
///
/// # Errors
///
/// Returns 422 for an invalid booking.
pub async fn create(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<NewAppointment>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let appointment = state.appointments().create(&staff, input).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Change an appointment's status.
///
/// # Errors
///
/// Returns 404 for an unknown id and 422 for a forbidden transition.
pub async fn update_status(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Appointment>, AppError> {
    Ok(Json(
        state
            .appointments()
            .update_status(&staff, id, body.status)
            .await?,
    ))
}

/// Delete an appointment.
///
/// # Errors
///
/// Returns 404 for an unknown id.
pub async fn remove(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
) -> Result<StatusCode, AppError> {
    state.appointments().delete(&staff, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
