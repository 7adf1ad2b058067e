//! Staff roster repository.

use sqlx::PgPool;
use tracing::instrument;

use salon_core::{Email, StaffId, UserId};

use super::RepositoryError;
use crate::models::StaffMember;

#[derive(Debug, sqlx::FromRow)]
struct StaffRow {
    id: StaffId,
    user_id: Option<UserId>,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    active: bool,
}

impl TryFrom<StaffRow> for StaffMember {
    type Error = RepositoryError;

    fn try_from(row: StaffRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid staff email: {e}")))?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            email,
            phone: row.phone,
            active: row.active,
        })
    }
}

/// Repository for the staff roster.
pub struct StaffRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StaffRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active staff, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<StaffMember>, RepositoryError> {
        let rows = sqlx::query_as::<_, StaffRow>(
            "SELECT id, user_id, name, email, phone, active \
             FROM salon.staff WHERE active ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a staff member by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: StaffId) -> Result<Option<StaffMember>, RepositoryError> {
        let row = sqlx::query_as::<_, StaffRow>(
            "SELECT id, user_id, name, email, phone, active FROM salon.staff WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// The roster entry linked to a login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_by_user(&self, user: UserId) -> Result<Option<StaffMember>, RepositoryError> {
        let row = sqlx::query_as::<_, StaffRow>(
            "SELECT id, user_id, name, email, phone, active FROM salon.staff WHERE user_id = $1",
        )
        .bind(user)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
