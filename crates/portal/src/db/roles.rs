//! User role repository.
//!
//! Each login holds at most one role. Only operators change roles, through
//! the CLI.

use sqlx::PgPool;
use tracing::instrument;

use salon_core::{Role, UserId};

use super::RepositoryError;
use crate::permissions::RoleSource;

/// Repository for `user_roles`.
pub struct UserRoleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRoleRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The role assigned to `user`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, user: UserId) -> Result<Option<Role>, RepositoryError> {
        let role =
            sqlx::query_scalar::<_, Role>("SELECT role FROM salon.user_roles WHERE user_id = $1")
                .bind(user)
                .fetch_optional(self.pool)
                .await?;
        Ok(role)
    }

    /// Assign `role` to `user`, replacing any previous role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    #[instrument(skip(self))]
    pub async fn assign(&self, user: UserId, role: Role) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO salon.user_roles (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role, updated_at = now()
            ",
        )
        .bind(user)
        .bind(role)
        .execute(self.pool)
        .await
        .map_err(RepositoryError::from_write)?;
        Ok(())
    }

    /// Every assignment, grouped by role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<(UserId, Role)>, RepositoryError> {
        let rows = sqlx::query_as::<_, (UserId, Role)>(
            "SELECT user_id, role FROM salon.user_roles ORDER BY role, user_id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

impl RoleSource for UserRoleRepository<'_> {
    type Error = RepositoryError;

    async fn role_for(&self, user: UserId) -> Result<Option<Role>, RepositoryError> {
        self.get(user).await
    }
}
