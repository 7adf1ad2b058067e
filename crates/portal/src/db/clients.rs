//! Client record repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use salon_core::{ClientId, Email};

use super::RepositoryError;
use crate::models::Client;
use crate::services::validation::ValidClient;

/// Cap on rows returned by a list or search.
const MAX_RESULTS: i64 = 200;

#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: ClientId,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ClientRow> for Client {
    type Error = RepositoryError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            phone: row.phone,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

/// Repository for client records.
pub struct ClientRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ClientRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Clients whose name, email, or phone contains `search`; all clients
    /// when `search` is `None`. Sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    #[instrument(skip(self))]
    pub async fn search(&self, search: Option<&str>) -> Result<Vec<Client>, RepositoryError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let rows = sqlx::query_as::<_, ClientRow>(
            r"
            SELECT id, name, email, phone, notes, created_at
            FROM salon.clients
            WHERE $1::text IS NULL
               OR name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1
            ORDER BY name
            LIMIT $2
            ",
        )
        .bind(pattern)
        .bind(MAX_RESULTS)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a client by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query_as::<_, ClientRow>(
            "SELECT id, name, email, phone, notes, created_at FROM salon.clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a validated client.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already on file.
    #[instrument(skip(self, client))]
    pub async fn create(&self, client: &ValidClient) -> Result<Client, RepositoryError> {
        let row = sqlx::query_as::<_, ClientRow>(
            r"
            INSERT INTO salon.clients (name, email, phone, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, phone, notes, created_at
            ",
        )
        .bind(&client.name)
        .bind(client.email.as_ref().map(Email::as_str))
        .bind(client.phone.as_deref())
        .bind(client.notes.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        row.try_into()
    }
}

/// Escape `LIKE` wildcards in user input.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
