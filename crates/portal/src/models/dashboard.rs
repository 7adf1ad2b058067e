//! Dashboard summary.

use serde::{Deserialize, Serialize};

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Active appointments starting today.
    pub todays_appointments: i64,
    /// Active appointments starting after today.
    pub upcoming_appointments: i64,
    pub total_clients: i64,
    pub pending_time_off: i64,
}
