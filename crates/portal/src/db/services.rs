//! Service menu repository.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use salon_core::{Price, ServiceId};

use super::RepositoryError;
use crate::models::SalonService;

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: ServiceId,
    name: String,
    duration_minutes: i32,
    price: Decimal,
    active: bool,
}

impl TryFrom<ServiceRow> for SalonService {
    type Error = RepositoryError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for service {}: {e}", row.id))
        })?;
        if row.duration_minutes <= 0 {
            return Err(RepositoryError::DataCorruption(format!(
                "service {} has non-positive duration",
                row.id
            )));
        }

        Ok(Self {
            id: row.id,
            name: row.name,
            duration_minutes: row.duration_minutes,
            price,
            active: row.active,
        })
    }
}

/// Repository for the service menu.
pub struct ServiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ServiceRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Bookable services, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<SalonService>, RepositoryError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, name, duration_minutes, price, active \
             FROM salon.services WHERE active ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
