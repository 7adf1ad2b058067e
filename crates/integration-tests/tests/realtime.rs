//! Row-change notifications reaching the query cache.

use std::sync::Arc;
use std::time::Duration;

use salon_integration_tests::RecordingInvalidator;
use salon_portal::cache::{QueryCache, QueryKey, QueryRoot};
use salon_portal::realtime::{
    ChangeEvent, ChangeFilter, ChangeHub, ChangeKind, EventFilter, RealtimeSync,
};

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_appointment_change_invalidates_three_roots() {
    let hub = ChangeHub::new(16);
    let recorder = Arc::new(RecordingInvalidator::new());
    let sync = RealtimeSync::start(
        &hub,
        Arc::clone(&recorder),
        RealtimeSync::default_filters(),
    );

    hub.publish(ChangeEvent::new("appointments", ChangeKind::Update, None));
    let roots = recorder.wait_for(3, WAIT).await;

    assert_eq!(
        roots,
        vec![
            QueryRoot::Appointments,
            QueryRoot::TodayAppointments,
            QueryRoot::DashboardStats,
        ]
    );

    // Other subscriptions see the event but must not touch the cache.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(recorder.roots().len(), 3);
    sync.close();
}

#[tokio::test]
async fn test_unwatched_table_is_ignored() {
    let hub = ChangeHub::new(16);
    let recorder = Arc::new(RecordingInvalidator::new());
    let sync = RealtimeSync::start(
        &hub,
        Arc::clone(&recorder),
        RealtimeSync::default_filters(),
    );

    hub.publish(ChangeEvent::new("audit_log", ChangeKind::Insert, None));
    hub.publish(ChangeEvent::new("services", ChangeKind::Delete, None));

    let roots = recorder.wait_for(1, WAIT).await;
    assert_eq!(roots, vec![QueryRoot::Services]);
    sync.close();
}

#[tokio::test]
async fn test_event_filter_limits_kinds() {
    let hub = ChangeHub::new(16);
    let recorder = Arc::new(RecordingInvalidator::new());
    let filter = ChangeFilter::new("clients", EventFilter::Only(ChangeKind::Insert));
    let sync = RealtimeSync::start(&hub, Arc::clone(&recorder), [filter]);

    hub.publish(ChangeEvent::new("clients", ChangeKind::Delete, None));
    hub.publish(ChangeEvent::new("clients", ChangeKind::Insert, None));

    let roots = recorder.wait_for(2, WAIT).await;
    assert_eq!(roots, vec![QueryRoot::Clients, QueryRoot::DashboardStats]);
    sync.close();
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let hub = ChangeHub::new(16);
    let recorder = Arc::new(RecordingInvalidator::new());
    let sync = RealtimeSync::start(
        &hub,
        Arc::clone(&recorder),
        RealtimeSync::default_filters(),
    );
    assert_eq!(sync.subscription_count(), 6);

    sync.close();
    sync.close();

    assert!(sync.is_closed());
    assert_eq!(sync.subscription_count(), 0);
}

#[tokio::test]
async fn test_change_drops_cached_query() {
    let hub = ChangeHub::new(16);
    let cache = QueryCache::new(Duration::from_secs(60));
    let sync = RealtimeSync::start(&hub, Arc::new(cache.clone()), RealtimeSync::default_filters());

    let key = QueryKey::scoped(QueryRoot::Clients, "*");
    cache.insert(key.clone(), vec!["Ada".to_string()]).await;
    let other = QueryKey::root(QueryRoot::Services);
    cache.insert(other.clone(), 3_u32).await;

    hub.publish(ChangeEvent::new("clients", ChangeKind::Insert, None));

    let deadline = tokio::time::Instant::now() + WAIT;
    while cache.get::<Vec<String>>(&key).await.is_some() {
        assert!(tokio::time::Instant::now() < deadline, "client list was never invalidated");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(cache.get::<u32>(&other).await, Some(3));
    sync.close();
}

#[test]
fn test_notification_payload() {
    let event = ChangeEvent::from_payload(
        r#"{"table":"time_off_requests","type":"INSERT","id":"8f2d3c1e-5b4a-4e6f-9a8b-7c6d5e4f3a2b"}"#,
    )
    .expect("valid payload");
    assert_eq!(event.table, "time_off_requests");
    assert_eq!(event.kind, ChangeKind::Insert);
    assert!(event.id.is_some());
    assert!(ChangeEvent::from_payload("not json").is_err());
}
