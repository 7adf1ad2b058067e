//! Client records API handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::RequireStaff;
use crate::models::{Client, NewClient};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/clients", get(search).post(create))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Search clients by name, email, or phone.
///
/// # Errors
///
/// Returns 403 without `clients:view`.
pub async fn search(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Client>>, AppError> {
    Ok(Json(state.clients().search(&staff, query.search.as_deref()).await?))
}

/// Add a client.
///
/// # Errors
///
/// Returns 422 for a blank name or malformed email, 409 for a duplicate.
pub async fn create(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<NewClient>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    let client = state.clients().create(&staff, input).await?;
    Ok((StatusCode::CREATED, Json(client)))
}
