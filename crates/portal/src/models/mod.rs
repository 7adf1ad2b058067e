//! Domain models for the salon portal.
//!
//! These are the shapes handed to API callers and stored in the query cache.
//! Database row types live next to their repositories in [`crate::db`].

pub mod appointment;
pub mod client;
pub mod dashboard;
pub mod service;
pub mod session;
pub mod staff;
pub mod time_off;

pub use appointment::{Appointment, NewAppointment};
pub use client::{Client, NewClient};
pub use dashboard::DashboardStats;
pub use service::SalonService;
pub use session::CurrentStaff;
pub use staff::StaffMember;
pub use time_off::{NewTimeOffRequest, TimeOffDecision, TimeOffRequest};
