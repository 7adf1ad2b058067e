//! HTTP route handlers for the portal API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /api/me                        - Caller, role, and UI layout
//!
//! # Appointments
//! GET    /api/appointments?date=        - Appointments on a day (default today)
//! GET    /api/appointments/today        - Today's appointments
//! POST   /api/appointments              - Book an appointment
//! PATCH  /api/appointments/{id}/status  - Change status
//! DELETE /api/appointments/{id}         - Delete
//!
//! # Clients
//! GET    /api/clients?search=           - Search clients
//! POST   /api/clients                   - Add a client
//!
//! # Roster
//! GET    /api/staff                     - Active staff
//! GET    /api/services                  - Service menu
//!
//! # Time off
//! GET    /api/time-off                  - Own requests, or all for reviewers
//! POST   /api/time-off                  - Submit a request
//! PATCH  /api/time-off/{id}             - Approve or reject
//!
//! # Dashboard
//! GET    /api/dashboard/stats           - Counters
//! ```
//!
//! Every route requires a bearer token (see [`crate::middleware::RequireStaff`]).

pub mod appointments;
pub mod clients;
pub mod dashboard;
pub mod me;
pub mod roster;
pub mod time_off;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(me::router())
        .merge(appointments::router())
        .merge(clients::router())
        .merge(roster::router())
        .merge(time_off::router())
        .merge(dashboard::router())
}
