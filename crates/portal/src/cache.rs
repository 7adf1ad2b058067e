//! Query result cache.
//!
//! Results are cached under a [`QueryKey`]: a fixed [`QueryRoot`] plus an
//! optional scope such as a date or user id. Entries are never patched in
//! place. A change anywhere under a root invalidates every entry of that root
//! and the next read goes back to the database.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;

/// Top-level cache namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryRoot {
    Appointments,
    TodayAppointments,
    DashboardStats,
    Clients,
    Staff,
    Services,
    TimeOffRequests,
    StaffSchedules,
    UserRole,
}

impl QueryRoot {
    pub const ALL: [Self; 9] = [
        Self::Appointments,
        Self::TodayAppointments,
        Self::DashboardStats,
        Self::Clients,
        Self::Staff,
        Self::Services,
        Self::TimeOffRequests,
        Self::StaffSchedules,
        Self::UserRole,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Appointments => "appointments",
            Self::TodayAppointments => "today-appointments",
            Self::DashboardStats => "dashboard-stats",
            Self::Clients => "clients",
            Self::Staff => "staff",
            Self::Services => "services",
            Self::TimeOffRequests => "time-off-requests",
            Self::StaffSchedules => "staff-schedules",
            Self::UserRole => "user-role",
        }
    }
}

impl fmt::Display for QueryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key: a root plus an optional scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub root: QueryRoot,
    pub scope: Option<String>,
}

impl QueryKey {
    /// Key covering the whole root.
    #[must_use]
    pub const fn root(root: QueryRoot) -> Self {
        Self { root, scope: None }
    }

    /// Key for one scope under `root`.
    #[must_use]
    pub fn scoped(root: QueryRoot, scope: impl ToString) -> Self {
        Self {
            root,
            scope: Some(scope.to_string()),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}:{scope}", self.root),
            None => write!(f, "{}", self.root),
        }
    }
}

/// Something that can drop cached results for a root.
pub trait QueryInvalidator: Send + Sync + 'static {
    /// Invalidate every entry under `root`. Fire-and-forget.
    fn invalidate_root(&self, root: QueryRoot) -> impl Future<Output = ()> + Send;
}

type CachedValue = Arc<dyn Any + Send + Sync>;

/// In-memory query cache backed by `moka`.
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<QueryKey, CachedValue>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl QueryCache {
    /// Create a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Self { inner }
    }

    /// Cached value for `key`, if present and of type `T`.
    pub async fn get<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let value = self.inner.get(key).await?;
        value.downcast_ref::<T>().cloned()
    }

    /// Store `value` under `key`. Last write wins.
    pub async fn insert<T>(&self, key: QueryKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.inner.insert(key, Arc::new(value)).await;
    }

    /// Return the cached value for `key`, or run `fetch` and cache its result.
    ///
    /// Failed fetches are not cached.
    ///
    /// # Errors
    ///
    /// Returns whatever `fetch` returns.
    pub async fn get_or_fetch<T, E, Fut>(&self, key: QueryKey, fetch: Fut) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(&key).await {
            tracing::trace!(%key, "Query cache hit");
            return Ok(value);
        }

        let value = fetch.await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Drop a single entry.
    pub async fn invalidate(&self, key: &QueryKey) {
        self.inner.invalidate(key).await;
    }

    /// Drop everything, e.g. on sign-out.
    pub async fn invalidate_all(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
    }
}

impl QueryInvalidator for QueryCache {
    async fn invalidate_root(&self, root: QueryRoot) {
        match self.inner.invalidate_entries_if(move |key, _| key.root == root) {
            Ok(_) => tracing::debug!(%root, "Invalidated query root"),
            Err(e) => tracing::error!(%root, error = %e, "Failed to invalidate query root"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_fetch_caches_success() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let key = QueryKey::scoped(QueryRoot::Appointments, "2026-10-17");

        let first: Result<Vec<u32>, ()> = cache
            .get_or_fetch(key.clone(), async { Ok(vec![1, 2]) })
            .await;
        let second: Result<Vec<u32>, ()> = cache.get_or_fetch(key, async { Ok(vec![9]) }).await;

        assert_eq!(first, Ok(vec![1, 2]));
        assert_eq!(second, Ok(vec![1, 2]));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let key = QueryKey::root(QueryRoot::Clients);

        let failed: Result<u32, &str> =
            cache.get_or_fetch(key.clone(), async { Err("down") }).await;
        assert_eq!(failed, Err("down"));
        assert_eq!(cache.get::<u32>(&key).await, None);
    }

    #[tokio::test]
    async fn test_invalidate_root_drops_all_scopes() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let monday = QueryKey::scoped(QueryRoot::Appointments, "2026-10-12");
        let tuesday = QueryKey::scoped(QueryRoot::Appointments, "2026-10-13");
        let services = QueryKey::root(QueryRoot::Services);
        cache.insert(monday.clone(), 1_u32).await;
        cache.insert(tuesday.clone(), 2_u32).await;
        cache.insert(services.clone(), 3_u32).await;

        cache.invalidate_root(QueryRoot::Appointments).await;

        assert_eq!(cache.get::<u32>(&monday).await, None);
        assert_eq!(cache.get::<u32>(&tuesday).await, None);
        assert_eq!(cache.get::<u32>(&services).await, Some(3));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_a_miss() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let key = QueryKey::root(QueryRoot::Staff);
        cache.insert(key.clone(), "not a number".to_string()).await;
        assert_eq!(cache.get::<u32>(&key).await, None);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(QueryKey::root(QueryRoot::TimeOffRequests).to_string(), "time-off-requests");
        assert_eq!(
            QueryKey::scoped(QueryRoot::UserRole, "abc").to_string(),
            "user-role:abc"
        );
    }
}
