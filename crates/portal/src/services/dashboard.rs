//! Dashboard counters.

use chrono::NaiveDate;
use tracing::instrument;

use salon_core::PermissionArea;

use super::ServiceContext;
use super::validation::day_bounds;
use crate::cache::{QueryKey, QueryRoot};
use crate::db::DashboardRepository;
use crate::error::AppError;
use crate::gate::RoleGate;
use crate::models::{CurrentStaff, DashboardStats};

#[derive(Debug, Clone)]
pub struct DashboardService {
    ctx: ServiceContext,
}

impl DashboardService {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Counters as of `today`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` without `dashboard:view`, or
    /// `ValidationError::DateOutOfRange` when `today` has no successor.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn stats(
        &self,
        caller: &CurrentStaff,
        today: NaiveDate,
    ) -> Result<DashboardStats, AppError> {
        RoleGate::view(PermissionArea::Dashboard).authorize(&caller.permissions)?;

        let (day_start, day_end) = day_bounds(today)?;
        let repo = DashboardRepository::new(&self.ctx.pool);
        let stats = self
            .ctx
            .cache
            .get_or_fetch(
                QueryKey::scoped(QueryRoot::DashboardStats, today),
                self.ctx.retry.run(|| repo.stats(day_start, day_end)),
            )
            .await?;
        Ok(stats)
    }
}
