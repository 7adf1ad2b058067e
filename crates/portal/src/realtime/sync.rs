//! Keeps cached queries in step with row changes.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::feed::{ChangeEvent, ChangeFilter, ChangeHub};
use crate::cache::{QueryInvalidator, QueryRoot};

/// Tables with a notify trigger.
pub const WATCHED_TABLES: [&str; 6] = [
    "appointments",
    "clients",
    "staff",
    "services",
    "time_off_requests",
    "user_roles",
];

/// Query roots to drop when `table` changes.
#[must_use]
pub fn invalidation_targets(table: &str) -> &'static [QueryRoot] {
    match table {
        "appointments" => &[
            QueryRoot::Appointments,
            QueryRoot::TodayAppointments,
            QueryRoot::DashboardStats,
        ],
        "clients" => &[QueryRoot::Clients, QueryRoot::DashboardStats],
        "staff" => &[QueryRoot::Staff, QueryRoot::StaffSchedules],
        "services" => &[QueryRoot::Services],
        "time_off_requests" => &[
            QueryRoot::TimeOffRequests,
            QueryRoot::StaffSchedules,
            QueryRoot::DashboardStats,
        ],
        "user_roles" => &[QueryRoot::UserRole],
        _ => &[],
    }
}

/// Owns one subscription task per filter.
///
/// Closing is idempotent and also happens on drop. Closing aborts the
/// subscription tasks; an invalidation already in flight may or may not
/// complete.
#[derive(Debug)]
pub struct RealtimeSync {
    tasks: Mutex<Option<Vec<JoinHandle<()>>>>,
}

impl RealtimeSync {
    /// Subscribe to `filters` on `hub`.
    ///
    /// Subscriptions are registered before this returns, so events published
    /// afterwards are never missed. Must be called inside a Tokio runtime.
    pub fn start<I>(
        hub: &ChangeHub,
        invalidator: Arc<I>,
        filters: impl IntoIterator<Item = ChangeFilter>,
    ) -> Self
    where
        I: QueryInvalidator,
    {
        let tasks = filters
            .into_iter()
            .map(|filter| {
                let receiver = hub.subscribe();
                let invalidator = Arc::clone(&invalidator);
                tracing::debug!(%filter, "Subscribing to row changes");
                tokio::spawn(subscription(filter, receiver, invalidator))
            })
            .collect();

        Self {
            tasks: Mutex::new(Some(tasks)),
        }
    }

    /// Every change on every watched table.
    #[must_use]
    pub fn default_filters() -> Vec<ChangeFilter> {
        WATCHED_TABLES.into_iter().map(ChangeFilter::table).collect()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.lock().as_ref().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Tear down every subscription. Later calls do nothing.
    pub fn close(&self) {
        let Some(tasks) = self.lock().take() else {
            return;
        };
        for task in &tasks {
            task.abort();
        }
        tracing::info!(subscriptions = tasks.len(), "Realtime sync closed");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Vec<JoinHandle<()>>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RealtimeSync {
    fn drop(&mut self) {
        self.close();
    }
}

async fn subscription<I>(
    filter: ChangeFilter,
    mut receiver: tokio::sync::broadcast::Receiver<ChangeEvent>,
    invalidator: Arc<I>,
) where
    I: QueryInvalidator,
{
    loop {
        match receiver.recv().await {
            Ok(event) if filter.matches(&event) => {
                invalidate(invalidator.as_ref(), &filter.table).await;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                // Missed events collapse into a single invalidation.
                tracing::warn!(%filter, skipped, "Change subscriber lagged");
                invalidate(invalidator.as_ref(), &filter.table).await;
            }
            Err(RecvError::Closed) => {
                tracing::debug!(%filter, "Change hub closed");
                break;
            }
        }
    }
}

async fn invalidate<I: QueryInvalidator>(invalidator: &I, table: &str) {
    let targets = invalidation_targets(table);
    if targets.is_empty() {
        tracing::debug!(table, "No cached queries for table");
    }
    for root in targets {
        invalidator.invalidate_root(*root).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::realtime::{ChangeKind, EventFilter};

    #[derive(Default)]
    struct Recorder {
        roots: Mutex<Vec<QueryRoot>>,
    }

    impl Recorder {
        fn roots(&self) -> Vec<QueryRoot> {
            self.roots.lock().unwrap().clone()
        }
    }

    impl QueryInvalidator for Recorder {
        async fn invalidate_root(&self, root: QueryRoot) {
            self.roots.lock().unwrap().push(root);
        }
    }

    async fn wait_for_roots(recorder: &Recorder, count: usize) -> Vec<QueryRoot> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let roots = recorder.roots();
                if roots.len() >= count {
                    return roots;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_matching_event_invalidates_roots() {
        let hub = ChangeHub::new(16);
        let recorder = Arc::new(Recorder::default());
        let sync = RealtimeSync::start(&hub, recorder.clone(), [ChangeFilter::table("clients")]);

        hub.publish(ChangeEvent::new("staff", ChangeKind::Update, None));
        hub.publish(ChangeEvent::new("clients", ChangeKind::Insert, None));

        let roots = wait_for_roots(&recorder, 2).await;
        assert_eq!(roots, vec![QueryRoot::Clients, QueryRoot::DashboardStats]);
        sync.close();
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let hub = ChangeHub::new(16);
        let sync = RealtimeSync::start(
            &hub,
            Arc::new(Recorder::default()),
            RealtimeSync::default_filters(),
        );
        assert_eq!(sync.subscription_count(), WATCHED_TABLES.len());

        sync.close();
        sync.close();

        assert!(sync.is_closed());
        assert_eq!(sync.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_invalidates_and_keeps_running() {
        let hub = ChangeHub::new(1);
        let recorder = Arc::new(Recorder::default());
        let sync = RealtimeSync::start(&hub, recorder.clone(), [ChangeFilter::table("clients")]);

        // The task has not polled yet, so two of these are overwritten.
        for _ in 0..3 {
            hub.publish(ChangeEvent::new("clients", ChangeKind::Update, None));
        }

        // One invalidation for the lag, one for the surviving event.
        let roots = wait_for_roots(&recorder, 4).await;
        assert_eq!(
            roots,
            vec![
                QueryRoot::Clients,
                QueryRoot::DashboardStats,
                QueryRoot::Clients,
                QueryRoot::DashboardStats,
            ]
        );
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(recorder.roots().len(), 4);

        hub.publish(ChangeEvent::new("clients", ChangeKind::Delete, None));
        assert_eq!(wait_for_roots(&recorder, 6).await.len(), 6);
        sync.close();
    }

    #[tokio::test]
    async fn test_drop_releases_subscriptions() {
        let hub = ChangeHub::new(16);
        let sync = RealtimeSync::start(
            &hub,
            Arc::new(Recorder::default()),
            RealtimeSync::default_filters(),
        );
        assert_eq!(hub.subscriber_count(), WATCHED_TABLES.len());

        drop(sync);

        tokio::time::timeout(Duration::from_secs(5), async {
            while hub.subscriber_count() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        let reached = hub.publish(ChangeEvent::new("staff", ChangeKind::Insert, None));
        assert_eq!(reached, 0);
    }

    #[test]
    fn test_appointments_targets() {
        assert_eq!(
            invalidation_targets("appointments"),
            &[
                QueryRoot::Appointments,
                QueryRoot::TodayAppointments,
                QueryRoot::DashboardStats
            ]
        );
    }

    #[test]
    fn test_every_watched_table_has_targets() {
        for table in WATCHED_TABLES {
            assert!(!invalidation_targets(table).is_empty(), "{table}");
        }
        assert!(invalidation_targets("audit_log").is_empty());
    }

    #[test]
    fn test_default_filters_cover_watched_tables() {
        let filters = RealtimeSync::default_filters();
        assert_eq!(filters.len(), WATCHED_TABLES.len());
        assert!(filters.iter().all(|f| f.event == EventFilter::All));
    }
}
