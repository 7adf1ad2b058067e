//! Client records service.

use tracing::{info, instrument};

use salon_core::{Action, PermissionArea};

use super::ServiceContext;
use super::validation::validate_client;
use crate::cache::{QueryKey, QueryRoot};
use crate::db::ClientRepository;
use crate::error::AppError;
use crate::gate::RoleGate;
use crate::models::{Client, CurrentStaff, NewClient};

/// Reads and writes on client records.
#[derive(Debug, Clone)]
pub struct ClientService {
    ctx: ServiceContext,
}

impl ClientService {
    #[must_use]
    pub const fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Clients matching `search`, or all clients.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` without `clients:view`.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn search(
        &self,
        caller: &CurrentStaff,
        search: Option<&str>,
    ) -> Result<Vec<Client>, AppError> {
        RoleGate::view(PermissionArea::Clients).authorize(&caller.permissions)?;

        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let key = QueryKey::scoped(QueryRoot::Clients, search.unwrap_or("*").to_lowercase());
        let repo = ClientRepository::new(&self.ctx.pool);
        let clients = self
            .ctx
            .cache
            .get_or_fetch(key, self.ctx.retry.run(|| repo.search(search)))
            .await?;
        Ok(clients)
    }

    /// Add a client record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a blank name or malformed email.
    #[instrument(skip(self, caller, input), fields(user_id = %caller.user_id))]
    pub async fn create(
        &self,
        caller: &CurrentStaff,
        input: NewClient,
    ) -> Result<Client, AppError> {
        RoleGate::new(PermissionArea::Clients, Action::Create)
            .authorize(&caller.permissions)?;
        let client = validate_client(input)?;

        let created = ClientRepository::new(&self.ctx.pool).create(&client).await?;
        info!(client_id = %created.id, "Client created");
        self.ctx.invalidate_table("clients").await;
        Ok(created)
    }
}
