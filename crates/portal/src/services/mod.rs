//! Business logic services for the salon portal.
//!
//! Every service method takes the [`CurrentStaff`] making the call, checks
//! it against a [`RoleGate`](crate::gate::RoleGate) before touching the
//! database, and reads through the [`QueryCache`]. Reads are retried on
//! transient failures; writes are not, since an insert that timed out may
//! still have landed.
//!
//! # Services
//!
//! - `appointments` - The appointment book
//! - `auth` - Hosted auth client and session monitor
//! - `clients` - Client records
//! - `dashboard` - Dashboard counters
//! - `roster` - Staff roster and service menu
//! - `time_off` - Staff time-off self-service and review
//! - `validation` - Input checks shared by the write paths

pub mod appointments;
pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod roster;
pub mod time_off;
pub mod validation;

use sqlx::PgPool;

pub use appointments::AppointmentService;
pub use clients::ClientService;
pub use dashboard::DashboardService;
pub use roster::RosterService;
pub use time_off::TimeOffService;

use crate::cache::{QueryCache, QueryInvalidator};
use crate::db::RepositoryError;
use crate::error::AppError;
use crate::models::CurrentStaff;
use crate::realtime::invalidation_targets;
use crate::retry::RetryPolicy;

/// Shared handles every service needs.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    pub pool: PgPool,
    pub cache: QueryCache,
    pub retry: RetryPolicy,
}

impl ServiceContext {
    #[must_use]
    pub const fn new(pool: PgPool, cache: QueryCache, retry: RetryPolicy) -> Self {
        Self { pool, cache, retry }
    }

    /// Drop the cached roots that depend on `table`.
    ///
    /// The change feed will do the same shortly; doing it here makes the
    /// caller's own write visible on its next read.
    pub async fn invalidate_table(&self, table: &str) {
        for root in invalidation_targets(table) {
            self.cache.invalidate_root(*root).await;
        }
    }
}

/// Map a repository `NotFound` to a named API `NotFound`.
pub(crate) fn not_found(what: &'static str) -> impl FnOnce(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => AppError::NotFound(what.to_string()),
        other => AppError::Database(other),
    }
}

/// The caller's roster entry, required for self-service.
pub(crate) fn require_roster(
    caller: &CurrentStaff,
) -> Result<salon_core::StaffId, validation::ValidationError> {
    caller.staff_id.ok_or(validation::ValidationError::NotOnRoster)
}
