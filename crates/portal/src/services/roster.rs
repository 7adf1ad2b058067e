//! Staff roster and service menu.

use tracing::instrument;

use salon_core::PermissionArea;

use super::ServiceContext;
use crate::cache::{QueryKey, QueryRoot};
use crate::db::{ServiceRepository, StaffRepository};
use crate::error::AppError;
use crate::gate::RoleGate;
use crate::models::{CurrentStaff, SalonService, StaffMember};

#[derive(Debug, Clone)]
pub struct RosterService {
    ctx: ServiceContext,
}

impl RosterService {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Active staff. Everyone who can see the schedule can see who is on it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` without `schedule_management:view`.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn staff(&self, caller: &CurrentStaff) -> Result<Vec<StaffMember>, AppError> {
        RoleGate::view(PermissionArea::ScheduleManagement).authorize(&caller.permissions)?;

        let repo = StaffRepository::new(&self.ctx.pool);
        let staff = self
            .ctx
            .cache
            .get_or_fetch(
                QueryKey::root(QueryRoot::Staff),
                self.ctx.retry.run(|| repo.list_active()),
            )
            .await?;
        Ok(staff)
    }

    /// Bookable services.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` without `services:view`.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn services(&self, caller: &CurrentStaff) -> Result<Vec<SalonService>, AppError> {
        RoleGate::view(PermissionArea::Services).authorize(&caller.permissions)?;

        let repo = ServiceRepository::new(&self.ctx.pool);
        let services = self
            .ctx
            .cache
            .get_or_fetch(
                QueryKey::root(QueryRoot::Services),
                self.ctx.retry.run(|| repo.list_active()),
            )
            .await?;
        Ok(services)
    }
}
