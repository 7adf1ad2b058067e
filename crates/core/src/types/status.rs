//! Status enums for appointments and time-off requests.

use serde::{Deserialize, Serialize};

/// Lifecycle of a booked appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "salon.appointment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Whether the appointment still occupies a slot in the book.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed | Self::InProgress)
    }

    /// Whether the appointment has reached a final state.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Final states never change. Everything else may move forward or be
    /// cancelled.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (from, _) if from.is_final() => false,
            (Self::Scheduled, Self::Confirmed | Self::InProgress)
            | (Self::Confirmed, Self::InProgress)
            | (Self::InProgress, Self::Completed)
            | (Self::Scheduled | Self::Confirmed, Self::NoShow)
            | (_, Self::Cancelled) => true,
            _ => false,
        }
    }
}

/// Review state of a staff time-off request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "salon.time_off_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum TimeOffStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_states_are_frozen() {
        for next in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled,
        ] {
            assert!(!AppointmentStatus::Completed.can_transition_to(next));
            assert!(!AppointmentStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_forward_transitions() {
        assert!(AppointmentStatus::Scheduled.can_transition_to(AppointmentStatus::Confirmed));
        assert!(AppointmentStatus::Confirmed.can_transition_to(AppointmentStatus::InProgress));
        assert!(AppointmentStatus::InProgress.can_transition_to(AppointmentStatus::Completed));
        assert!(AppointmentStatus::InProgress.can_transition_to(AppointmentStatus::Cancelled));
        assert!(!AppointmentStatus::Completed.can_transition_to(AppointmentStatus::InProgress));
        assert!(!AppointmentStatus::InProgress.can_transition_to(AppointmentStatus::Scheduled));
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::NoShow).unwrap_or_default(),
            "\"no_show\""
        );
        assert_eq!(
            serde_json::to_string(&TimeOffStatus::Approved).unwrap_or_default(),
            "\"approved\""
        );
    }
}
