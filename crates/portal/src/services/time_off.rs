//! Time-off self-service.
//!
//! Staff see and submit their own requests. Anyone holding
//! `time_off_requests:edit` sees every request and decides on pending ones.

use chrono::NaiveDate;
use tracing::{info, instrument};

use salon_core::{Action, PermissionArea, TimeOffRequestId};

use super::validation::{ValidationError, validate_time_off};
use super::{ServiceContext, not_found, require_roster};
use crate::cache::{QueryKey, QueryRoot};
use crate::db::{ReviewOutcome, TimeOffRepository};
use crate::error::AppError;
use crate::gate::RoleGate;
use crate::models::{CurrentStaff, NewTimeOffRequest, TimeOffDecision, TimeOffRequest};

const TABLE: &str = "time_off_requests";

const REVIEW: RoleGate = RoleGate::new(PermissionArea::TimeOffRequests, Action::Edit);

#[derive(Debug, Clone)]
pub struct TimeOffService {
    ctx: ServiceContext,
}

impl TimeOffService {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Requests visible to the caller: all of them for reviewers, their own
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` without `time_off_requests:view` and
    /// `ValidationError::NotOnRoster` for a non-reviewer without a staff
    /// record.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn list(&self, caller: &CurrentStaff) -> Result<Vec<TimeOffRequest>, AppError> {
        RoleGate::view(PermissionArea::TimeOffRequests).authorize(&caller.permissions)?;

        let repo = TimeOffRepository::new(&self.ctx.pool);
        let requests = if REVIEW.authorize(&caller.permissions).is_ok() {
            self.ctx
                .cache
                .get_or_fetch(
                    QueryKey::scoped(QueryRoot::TimeOffRequests, "all"),
                    self.ctx.retry.run(|| repo.list_all()),
                )
                .await?
        } else {
            let staff = require_roster(caller)?;
            self.ctx
                .cache
                .get_or_fetch(
                    QueryKey::scoped(QueryRoot::TimeOffRequests, staff),
                    self.ctx.retry.run(|| repo.list_for_staff(staff)),
                )
                .await?
        };
        Ok(requests)
    }

    /// Submit a request for the caller.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a bad date range or a caller with no
    /// staff record.
    #[instrument(skip(self, caller, input), fields(user_id = %caller.user_id))]
    pub async fn submit(
        &self,
        caller: &CurrentStaff,
        input: NewTimeOffRequest,
        today: NaiveDate,
    ) -> Result<TimeOffRequest, AppError> {
        RoleGate::new(PermissionArea::TimeOffRequests, Action::Create)
            .authorize(&caller.permissions)?;
        let staff = require_roster(caller)?;
        validate_time_off(&input, today)?;

        let request = TimeOffRepository::new(&self.ctx.pool)
            .create(staff, &input)
            .await?;
        info!(request_id = %request.id, staff_id = %staff, "Time off requested");
        self.ctx.invalidate_table(TABLE).await;
        Ok(request)
    }

    /// Approve or reject a pending request.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id and
    /// `ValidationError::AlreadyReviewed` if the request was already decided.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn review(
        &self,
        caller: &CurrentStaff,
        id: TimeOffRequestId,
        decision: TimeOffDecision,
    ) -> Result<TimeOffRequest, AppError> {
        REVIEW.authorize(&caller.permissions)?;

        let outcome = TimeOffRepository::new(&self.ctx.pool)
            .review(id, decision.status(), caller.user_id)
            .await
            .map_err(not_found("time-off request"))?;

        match outcome {
            ReviewOutcome::Reviewed(request) => {
                info!(request_id = %id, status = ?request.status, "Time off reviewed");
                self.ctx.invalidate_table(TABLE).await;
                Ok(request)
            }
            ReviewOutcome::AlreadyReviewed(status) => {
                Err(ValidationError::AlreadyReviewed(status).into())
            }
        }
    }
}
