//! Database operations for the salon `PostgreSQL` schema.
//!
//! # Schema: `salon`
//!
//! ## Tables
//!
//! - `staff` - Team roster, optionally linked to a login
//! - `user_roles` - One role per login
//! - `clients` - Client records
//! - `services` - Service menu
//! - `appointments` - The appointment book
//! - `time_off_requests` - Staff leave requests
//!
//! Every table carries a trigger that publishes row changes on the
//! `salon_changes` channel (see [`crate::realtime`]).
//!
//! # Migrations
//!
//! Migrations are stored in `crates/portal/migrations/` and run via:
//! ```bash
//! cargo run -p salon-cli -- migrate
//! ```

pub mod appointments;
pub mod clients;
pub mod dashboard;
pub mod roles;
pub mod services;
pub mod staff;
pub mod time_off;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use appointments::AppointmentRepository;
pub use clients::ClientRepository;
pub use dashboard::DashboardRepository;
pub use roles::UserRoleRepository;
pub use services::ServiceRepository;
pub use staff::StaffRepository;
pub use time_off::{ReviewOutcome, TimeOffRepository};

use crate::error::ErrorClass;
use crate::retry::{ErrorClassifier, Retryable};

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a booking for a deleted client).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map constraint violations to `Conflict`, everything else to `Database`.
    pub(crate) fn from_write(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e
            && let Some(code) = db.code()
            && (code == UNIQUE_VIOLATION || code == FOREIGN_KEY_VIOLATION)
        {
            return Self::Conflict(db.message().to_string());
        }
        Self::Database(e)
    }

    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound => ErrorClass::NotFound,
            Self::Conflict(_) => ErrorClass::Validation,
            Self::Database(_) if self.is_retryable() => ErrorClass::Transient,
            Self::Database(_) | Self::DataCorruption(_) => ErrorClass::Internal,
        }
    }
}

impl Retryable for RepositoryError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Database(e) => is_transient(e),
            Self::DataCorruption(_) | Self::NotFound | Self::Conflict(_) => false,
        }
    }
}

fn is_transient(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => {
            let code = db.code();
            ErrorClassifier::shared().is_retryable(code.as_deref(), db.message())
        }
        other => ErrorClassifier::shared().is_retryable(None, &other.to_string()),
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
