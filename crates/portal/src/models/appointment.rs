//! Appointment types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salon_core::{AppointmentId, AppointmentStatus, ClientId, ServiceId, StaffId};

/// A booked appointment, joined with the names the book displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub client_id: ClientId,
    pub client_name: String,
    pub staff_id: StaffId,
    pub staff_name: String,
    pub service_id: ServiceId,
    pub service_name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

/// Input for booking an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub client_id: ClientId,
    pub staff_id: StaffId,
    pub service_id: ServiceId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}
