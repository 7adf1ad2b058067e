//! Dashboard counters.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;
use crate::models::DashboardStats;

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    todays_appointments: i64,
    upcoming_appointments: i64,
    total_clients: i64,
    pending_time_off: i64,
}

/// Repository for dashboard aggregates.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Counters for the day `[day_start, day_end)`; "upcoming" starts at
    /// `day_end`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn stats(
        &self,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<DashboardStats, RepositoryError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r"
            SELECT
                (SELECT count(*) FROM salon.appointments
                  WHERE starts_at >= $1 AND starts_at < $2
                    AND status IN ('scheduled', 'confirmed', 'in_progress')) AS todays_appointments,
                (SELECT count(*) FROM salon.appointments
                  WHERE starts_at >= $2
                    AND status IN ('scheduled', 'confirmed')) AS upcoming_appointments,
                (SELECT count(*) FROM salon.clients) AS total_clients,
                (SELECT count(*) FROM salon.time_off_requests
                  WHERE status = 'pending') AS pending_time_off
            ",
        )
        .bind(day_start)
        .bind(day_end)
        .fetch_one(self.pool)
        .await?;

        Ok(DashboardStats {
            todays_appointments: row.todays_appointments,
            upcoming_appointments: row.upcoming_appointments,
            total_clients: row.total_clients,
            pending_time_off: row.pending_time_off,
        })
    }
}
