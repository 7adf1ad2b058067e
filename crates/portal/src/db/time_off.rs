//! Time-off request repository.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::instrument;

use salon_core::{StaffId, TimeOffRequestId, TimeOffStatus, UserId};

use super::RepositoryError;
use crate::models::{NewTimeOffRequest, TimeOffRequest};

macro_rules! time_off_select {
    () => {
        r"
        SELECT t.id, t.staff_id, s.name AS staff_name, t.starts_on, t.ends_on,
               t.reason, t.status, t.reviewed_by, t.created_at
        FROM salon.time_off_requests t
        JOIN salon.staff s ON s.id = t.staff_id
        "
    };
}

#[derive(Debug, sqlx::FromRow)]
struct TimeOffRow {
    id: TimeOffRequestId,
    staff_id: StaffId,
    staff_name: String,
    starts_on: NaiveDate,
    ends_on: NaiveDate,
    reason: Option<String>,
    status: TimeOffStatus,
    reviewed_by: Option<UserId>,
    created_at: DateTime<Utc>,
}

impl From<TimeOffRow> for TimeOffRequest {
    fn from(row: TimeOffRow) -> Self {
        Self {
            id: row.id,
            staff_id: row.staff_id,
            staff_name: row.staff_name,
            starts_on: row.starts_on,
            ends_on: row.ends_on,
            reason: row.reason,
            status: row.status,
            reviewed_by: row.reviewed_by,
            created_at: row.created_at,
        }
    }
}

/// Result of a review attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The decision was recorded.
    Reviewed(TimeOffRequest),
    /// Someone had already decided; carries the existing status.
    AlreadyReviewed(TimeOffStatus),
}

/// Repository for time-off requests.
pub struct TimeOffRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TimeOffRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every request, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<TimeOffRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, TimeOffRow>(concat!(
            time_off_select!(),
            "ORDER BY t.created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// One staff member's requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_staff(
        &self,
        staff: StaffId,
    ) -> Result<Vec<TimeOffRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, TimeOffRow>(concat!(
            time_off_select!(),
            "WHERE t.staff_id = $1 ORDER BY t.created_at DESC"
        ))
        .bind(staff)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a request by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: TimeOffRequestId,
    ) -> Result<Option<TimeOffRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, TimeOffRow>(concat!(time_off_select!(), "WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Submit a pending request for `staff`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the staff member does not exist.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        staff: StaffId,
        input: &NewTimeOffRequest,
    ) -> Result<TimeOffRequest, RepositoryError> {
        let id = sqlx::query_scalar::<_, TimeOffRequestId>(
            r"
            INSERT INTO salon.time_off_requests (staff_id, starts_on, ends_on, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(staff)
        .bind(input.starts_on)
        .bind(input.ends_on)
        .bind(input.reason.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Record a decision on a request that is still pending.
    ///
    /// The update is conditional on `status = 'pending'`, so two reviewers
    /// racing on the same request cannot both win.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the request does not exist.
    #[instrument(skip(self))]
    pub async fn review(
        &self,
        id: TimeOffRequestId,
        status: TimeOffStatus,
        reviewer: UserId,
    ) -> Result<ReviewOutcome, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE salon.time_off_requests
            SET status = $2, reviewed_by = $3, reviewed_at = now()
            WHERE id = $1 AND status = 'pending'
            ",
        )
        .bind(id)
        .bind(status)
        .bind(reviewer)
        .execute(self.pool)
        .await?;

        let current = self.get(id).await?.ok_or(RepositoryError::NotFound)?;
        if result.rows_affected() == 0 {
            return Ok(ReviewOutcome::AlreadyReviewed(current.status));
        }
        Ok(ReviewOutcome::Reviewed(current))
    }
}
