//! Time-off request types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use salon_core::{StaffId, TimeOffRequestId, TimeOffStatus, UserId};

/// A staff member's request for time off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOffRequest {
    pub id: TimeOffRequestId,
    pub staff_id: StaffId,
    pub staff_name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub reason: Option<String>,
    pub status: TimeOffStatus,
    pub reviewed_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Input for submitting a time-off request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTimeOffRequest {
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A reviewer's decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOffDecision {
    Approve,
    Reject,
}

impl TimeOffDecision {
    /// Status the request ends up in.
    #[must_use]
    pub const fn status(self) -> TimeOffStatus {
        match self {
            Self::Approve => TimeOffStatus::Approved,
            Self::Reject => TimeOffStatus::Rejected,
        }
    }
}
