//! Appointment book service.

use chrono::NaiveDate;
use tracing::{info, instrument};

use salon_core::{Action, AppointmentId, AppointmentStatus, PermissionArea};

use super::validation::{ValidationError, day_bounds, validate_appointment, validate_transition};
use super::{ServiceContext, not_found};
use crate::cache::{QueryKey, QueryRoot};
use crate::db::{AppointmentRepository, RepositoryError};
use crate::error::AppError;
use crate::gate::RoleGate;
use crate::models::{Appointment, CurrentStaff, NewAppointment};

const TABLE: &str = "appointments";

/// Reads and writes on the appointment book.
#[derive(Debug, Clone)]
pub struct AppointmentService {
    ctx: ServiceContext,
}

impl AppointmentService {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    fn repo(&self) -> AppointmentRepository<'_> {
        AppointmentRepository::new(&self.ctx.pool)
    }

    /// Appointments on `date`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` without `appointments:view`,
    /// `ValidationError::DateOutOfRange` for a day with no successor, or the
    /// database error once retries are exhausted.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn list_for_day(
        &self,
        caller: &CurrentStaff,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppError> {
        RoleGate::view(PermissionArea::Appointments).authorize(&caller.permissions)?;

        let (from, to) = day_bounds(date)?;
        let repo = self.repo();
        let appointments = self
            .ctx
            .cache
            .get_or_fetch(
                QueryKey::scoped(QueryRoot::Appointments, date),
                self.ctx.retry.run(|| repo.list_between(from, to)),
            )
            .await?;
        Ok(appointments)
    }

    /// Appointments on `today`, cached under their own root so the
    /// dashboard can be invalidated independently of the calendar.
    ///
    /// # Errors
    ///
    /// Same as [`list_for_day`](Self::list_for_day).
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn today(
        &self,
        caller: &CurrentStaff,
        today: NaiveDate,
    ) -> Result<Vec<Appointment>, AppError> {
        RoleGate::view(PermissionArea::Appointments).authorize(&caller.permissions)?;

        let (from, to) = day_bounds(today)?;
        let repo = self.repo();
        let appointments = self
            .ctx
            .cache
            .get_or_fetch(
                QueryKey::scoped(QueryRoot::TodayAppointments, today),
                self.ctx.retry.run(|| repo.list_between(from, to)),
            )
            .await?;
        Ok(appointments)
    }

    /// Book an appointment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a bad time range, a double booking,
    /// or an unknown client, staff member, or service.
    #[instrument(
        skip(self, caller, input),
        fields(user_id = %caller.user_id, staff_id = %input.staff_id)
    )]
    pub async fn create(
        &self,
        caller: &CurrentStaff,
        input: NewAppointment,
    ) -> Result<Appointment, AppError> {
        RoleGate::new(PermissionArea::Appointments, Action::Create)
            .authorize(&caller.permissions)?;
        validate_appointment(&input)?;

        let repo = self.repo();
        if repo
            .staff_is_booked(input.staff_id, input.starts_at, input.ends_at)
            .await?
        {
            return Err(ValidationError::StaffDoubleBooked.into());
        }

        let appointment = repo.create(&input).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::Validation(
                ValidationError::UnknownReference("client, staff member, or service"),
            ),
            other => other.into(),
        })?;

        info!(appointment_id = %appointment.id, "Appointment booked");
        self.ctx.invalidate_table(TABLE).await;
        Ok(appointment)
    }

    /// Move an appointment through its lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id and
    /// `AppError::Validation` for a forbidden transition.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn update_status(
        &self,
        caller: &CurrentStaff,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppError> {
        RoleGate::new(PermissionArea::Appointments, Action::Edit).authorize(&caller.permissions)?;

        let repo = self.repo();
        let current = repo
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("appointment".to_string()))?;
        validate_transition(current.status, status)?;

        let updated = repo
            .update_status(id, status)
            .await
            .map_err(not_found("appointment"))?;
        info!(
            appointment_id = %id,
            from = ?current.status,
            to = ?status,
            "Appointment status changed"
        );
        self.ctx.invalidate_table(TABLE).await;
        Ok(updated)
    }

    /// Remove an appointment from the book.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn delete(&self, caller: &CurrentStaff, id: AppointmentId) -> Result<(), AppError> {
        RoleGate::new(PermissionArea::Appointments, Action::Delete).authorize(&caller.permissions)?;

        self.repo()
            .delete(id)
            .await
            .map_err(not_found("appointment"))?;
        info!(appointment_id = %id, "Appointment deleted");
        self.ctx.invalidate_table(TABLE).await;
        Ok(())
    }
}
