//! Input validation for writes.
//!
//! Validation failures are surfaced to the caller immediately and never
//! retried.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use thiserror::Error;

use salon_core::{AppointmentStatus, Email, EmailError, TimeOffStatus};

use crate::models::{NewAppointment, NewClient, NewTimeOffRequest};

/// Longest bookable appointment.
pub const MAX_APPOINTMENT_HOURS: i64 = 12;

/// Longest accepted free-text field.
const MAX_TEXT_LEN: usize = 2000;

/// Longest accepted name.
const MAX_NAME_LEN: usize = 200;

/// Why an input was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("appointment must end after it starts")]
    EndsBeforeStart,

    #[error("appointment cannot be longer than {MAX_APPOINTMENT_HOURS} hours")]
    AppointmentTooLong,

    #[error("time off must end on or after its first day")]
    InvalidDateRange,

    #[error("time off cannot start in the past")]
    StartsInPast,

    #[error("cannot change appointment from {from:?} to {to:?}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("request was already {0:?}")]
    AlreadyReviewed(TimeOffStatus),

    #[error("unknown {0}")]
    UnknownReference(&'static str),

    #[error("your login is not linked to a staff record")]
    NotOnRoster,

    #[error("staff member is already booked at that time")]
    StaffDoubleBooked,

    #[error("date {0} is out of range")]
    DateOutOfRange(NaiveDate),
}

/// A client record that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidClient {
    pub name: String,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// Check an appointment booking.
///
/// # Errors
///
/// Returns `ValidationError` if the time range is empty, inverted, or longer
/// than [`MAX_APPOINTMENT_HOURS`], or the notes are too long.
pub fn validate_appointment(input: &NewAppointment) -> Result<(), ValidationError> {
    if input.ends_at <= input.starts_at {
        return Err(ValidationError::EndsBeforeStart);
    }
    if input.ends_at - input.starts_at > TimeDelta::hours(MAX_APPOINTMENT_HOURS) {
        return Err(ValidationError::AppointmentTooLong);
    }
    check_len("notes", input.notes.as_deref(), MAX_TEXT_LEN)
}

/// Check and normalize a new client.
///
/// # Errors
///
/// Returns `ValidationError` for a blank name, an overlong field, or a
/// malformed email.
pub fn validate_client(input: NewClient) -> Result<ValidClient, ValidationError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(ValidationError::Required("name"));
    }
    check_len("name", Some(&name), MAX_NAME_LEN)?;
    check_len("notes", input.notes.as_deref(), MAX_TEXT_LEN)?;

    let email = match non_blank(input.email) {
        Some(raw) => Some(Email::parse(&raw)?),
        None => None,
    };

    Ok(ValidClient {
        name,
        email,
        phone: non_blank(input.phone),
        notes: non_blank(input.notes),
    })
}

/// Check a time-off request submitted on `today`.
///
/// # Errors
///
/// Returns `ValidationError` for an inverted range, a start in the past, or
/// an overlong reason.
pub fn validate_time_off(
    input: &NewTimeOffRequest,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    if input.ends_on < input.starts_on {
        return Err(ValidationError::InvalidDateRange);
    }
    if input.starts_on < today {
        return Err(ValidationError::StartsInPast);
    }
    check_len("reason", input.reason.as_deref(), MAX_TEXT_LEN)
}

/// UTC bounds `[midnight, next midnight)` of a calendar day.
///
/// # Errors
///
/// Returns `ValidationError::DateOutOfRange` for the last representable day.
pub fn day_bounds(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = start
        .checked_add_signed(TimeDelta::days(1))
        .ok_or(ValidationError::DateOutOfRange(date))?;
    Ok((start, end))
}

/// Check an appointment status change.
///
/// # Errors
///
/// Returns `ValidationError::InvalidTransition` if the lifecycle forbids it.
pub const fn validate_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), ValidationError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ValidationError::InvalidTransition { from, to })
    }
}

fn check_len(field: &'static str, value: Option<&str>, max: usize) -> Result<(), ValidationError> {
    match value {
        Some(value) if value.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        _ => Ok(()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use salon_core::{ClientId, ServiceId, StaffId};

    use super::*;

    fn booking(hours: i64) -> NewAppointment {
        let starts_at = Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap();
        NewAppointment {
            client_id: ClientId::random(),
            staff_id: StaffId::random(),
            service_id: ServiceId::random(),
            starts_at,
            ends_at: starts_at + TimeDelta::hours(hours),
            notes: None,
        }
    }

    #[test]
    fn test_appointment_ranges() {
        assert!(validate_appointment(&booking(1)).is_ok());
        assert!(validate_appointment(&booking(12)).is_ok());
        assert_eq!(validate_appointment(&booking(0)), Err(ValidationError::EndsBeforeStart));
        assert_eq!(validate_appointment(&booking(-1)), Err(ValidationError::EndsBeforeStart));
        assert_eq!(validate_appointment(&booking(13)), Err(ValidationError::AppointmentTooLong));
    }

    #[test]
    fn test_client_requires_name() {
        let result = validate_client(NewClient {
            name: "   ".to_string(),
            ..NewClient::default()
        });
        assert_eq!(result, Err(ValidationError::Required("name")));
    }

    #[test]
    fn test_client_normalizes_fields() {
        let client = validate_client(NewClient {
            name: "  Ada Lovelace ".to_string(),
            email: Some(" Ada@Example.COM ".to_string()),
            phone: Some(String::new()),
            notes: None,
        })
        .unwrap();
        assert_eq!(client.name, "Ada Lovelace");
        assert_eq!(client.email.unwrap().as_str(), "ada@example.com");
        assert_eq!(client.phone, None);
    }

    #[test]
    fn test_client_rejects_bad_email() {
        let result = validate_client(NewClient {
            name: "Grace".to_string(),
            email: Some("not-an-email".to_string()),
            ..NewClient::default()
        });
        assert!(matches!(result, Err(ValidationError::InvalidEmail(_))));
    }

    #[test]
    fn test_time_off_ranges() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let request = |start: u32, end: u32| NewTimeOffRequest {
            starts_on: NaiveDate::from_ymd_opt(2026, 10, start).unwrap(),
            ends_on: NaiveDate::from_ymd_opt(2026, 10, end).unwrap(),
            reason: None,
        };

        assert!(validate_time_off(&request(17, 17), today).is_ok());
        assert!(validate_time_off(&request(20, 24), today).is_ok());
        assert_eq!(
            validate_time_off(&request(24, 20), today),
            Err(ValidationError::InvalidDateRange)
        );
        assert_eq!(
            validate_time_off(&request(16, 18), today),
            Err(ValidationError::StartsInPast)
        );
    }

    #[test]
    fn test_day_bounds() {
        let (from, to) = day_bounds(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()).unwrap();
        assert_eq!(from.to_rfc3339(), "2026-10-17T00:00:00+00:00");
        assert_eq!(to - from, TimeDelta::days(1));
    }

    #[test]
    fn test_day_bounds_last_day_is_rejected() {
        assert_eq!(
            day_bounds(NaiveDate::MAX),
            Err(ValidationError::DateOutOfRange(NaiveDate::MAX))
        );
        assert!(day_bounds(NaiveDate::MAX.pred_opt().unwrap()).is_ok());
    }

    #[test]
    fn test_transitions() {
        assert!(
            validate_transition(AppointmentStatus::Scheduled, AppointmentStatus::Confirmed).is_ok()
        );
        assert!(matches!(
            validate_transition(AppointmentStatus::Completed, AppointmentStatus::Scheduled),
            Err(ValidationError::InvalidTransition { .. })
        ));
    }
}
