//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::QueryCache;
use crate::config::PortalConfig;
use crate::realtime::{ChangeHub, RealtimeSync};
use crate::retry::RetryPolicy;
use crate::services::auth::AuthClient;
use crate::services::{
    AppointmentService, ClientService, DashboardService, RosterService, ServiceContext,
    TimeOffService,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    ctx: ServiceContext,
    auth: AuthClient,
    hub: ChangeHub,
    realtime: RealtimeSync,
}

impl AppState {
    /// Build state and start invalidating the query cache from `hub`.
    ///
    /// The realtime subscriptions live as long as the last clone of the
    /// state.
    #[must_use]
    pub fn new(config: PortalConfig, pool: PgPool, hub: ChangeHub) -> Self {
        let cache = QueryCache::new(config.cache_ttl);
        let realtime = RealtimeSync::start(
            &hub,
            Arc::new(cache.clone()),
            RealtimeSync::default_filters(),
        );
        let auth = AuthClient::new(&config.auth);
        let ctx = ServiceContext::new(pool, cache, config.retry);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                ctx,
                auth,
                hub,
                realtime,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.ctx.pool
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.inner.ctx.cache
    }

    #[must_use]
    pub fn retry(&self) -> &RetryPolicy {
        &self.inner.ctx.retry
    }

    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    #[must_use]
    pub fn hub(&self) -> &ChangeHub {
        &self.inner.hub
    }

    #[must_use]
    pub fn realtime(&self) -> &RealtimeSync {
        &self.inner.realtime
    }

    #[must_use]
    pub fn appointments(&self) -> AppointmentService {
        AppointmentService::new(self.inner.ctx.clone())
    }

    #[must_use]
    pub fn clients(&self) -> ClientService {
        ClientService::new(self.inner.ctx.clone())
    }

    #[must_use]
    pub fn roster(&self) -> RosterService {
        RosterService::new(self.inner.ctx.clone())
    }

    #[must_use]
    pub fn time_off(&self) -> TimeOffService {
        TimeOffService::new(self.inner.ctx.clone())
    }

    #[must_use]
    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(self.inner.ctx.clone())
    }
}
