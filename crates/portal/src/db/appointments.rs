//! Appointment repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use salon_core::{AppointmentId, AppointmentStatus, ClientId, ServiceId, StaffId};

use super::RepositoryError;
use crate::models::{Appointment, NewAppointment};

/// Appointment columns joined with display names. Expands to a string
/// literal so that callers can `concat!` a `WHERE` clause onto it.
macro_rules! appointment_select {
    () => {
        r"
        SELECT a.id, a.client_id, c.name AS client_name,
               a.staff_id, s.name AS staff_name,
               a.service_id, sv.name AS service_name,
               a.starts_at, a.ends_at, a.status, a.notes
        FROM salon.appointments a
        JOIN salon.clients c ON c.id = a.client_id
        JOIN salon.staff s ON s.id = a.staff_id
        JOIN salon.services sv ON sv.id = a.service_id
        "
    };
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: AppointmentId,
    client_id: ClientId,
    client_name: String,
    staff_id: StaffId,
    staff_name: String,
    service_id: ServiceId,
    service_name: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    status: AppointmentStatus,
    notes: Option<String>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = RepositoryError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        if row.ends_at <= row.starts_at {
            return Err(RepositoryError::DataCorruption(format!(
                "appointment {} ends before it starts",
                row.id
            )));
        }

        Ok(Self {
            id: row.id,
            client_id: row.client_id,
            client_name: row.client_name,
            staff_id: row.staff_id,
            staff_name: row.staff_name,
            service_id: row.service_id,
            service_name: row.service_name,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            status: row.status,
            notes: row.notes,
        })
    }
}

/// Repository for the appointment book.
pub struct AppointmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AppointmentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Appointments starting in `[from, to)`, earliest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(concat!(
            appointment_select!(),
            "WHERE a.starts_at >= $1 AND a.starts_at < $2 ORDER BY a.starts_at, s.name"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an appointment by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: AppointmentId) -> Result<Option<Appointment>, RepositoryError> {
        let row =
            sqlx::query_as::<_, AppointmentRow>(concat!(appointment_select!(), "WHERE a.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Whether `staff` already has an active appointment overlapping
    /// `[starts_at, ends_at)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn staff_is_booked(
        &self,
        staff: StaffId,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let booked = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM salon.appointments
                WHERE staff_id = $1
                  AND status IN ('scheduled', 'confirmed', 'in_progress')
                  AND starts_at < $3 AND ends_at > $2
            )
            ",
        )
        .bind(staff)
        .bind(starts_at)
        .bind(ends_at)
        .fetch_one(self.pool)
        .await?;

        Ok(booked)
    }

    /// Book an appointment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the client, staff member, or
    /// service does not exist.
    #[instrument(skip(self, input), fields(staff_id = %input.staff_id))]
    pub async fn create(&self, input: &NewAppointment) -> Result<Appointment, RepositoryError> {
        let id = sqlx::query_scalar::<_, AppointmentId>(
            r"
            INSERT INTO salon.appointments (client_id, staff_id, service_id, starts_at, ends_at, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(input.client_id)
        .bind(input.staff_id)
        .bind(input.service_id)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.notes.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Set an appointment's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the appointment does not exist.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Appointment, RepositoryError> {
        let result = sqlx::query(
            "UPDATE salon.appointments SET status = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete an appointment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the appointment does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: AppointmentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM salon.appointments WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
