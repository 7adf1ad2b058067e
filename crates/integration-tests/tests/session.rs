//! Session upkeep: the background monitor and local persistence.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::TimeDelta;
use secrecy::ExposeSecret;

use salon_core::UserId;
use salon_integration_tests::session_expiring_in;
use salon_portal::config::SessionSettings;
use salon_portal::local_store::{LocalStore, StoreKey};
use salon_portal::services::auth::{
    AuthError, AuthSession, SessionMonitor, SessionRefresher, StoredSession,
};

#[derive(Clone, Copy)]
enum Reply {
    Fresh,
    Unreachable,
    Refused,
}

struct FakeRefresher {
    reply: Reply,
    calls: AtomicU32,
}

impl FakeRefresher {
    const fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SessionRefresher for &FakeRefresher {
    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Reply::Fresh => Ok(session_expiring_in(TimeDelta::hours(1), session.user.id)),
            Reply::Unreachable => Err(AuthError::Network("connection refused".to_string())),
            Reply::Refused => Err(AuthError::SessionExpired),
        }
    }
}

fn settings() -> SessionSettings {
    SessionSettings {
        check_interval: Duration::from_secs(60),
        refresh_margin: Duration::from_secs(300),
    }
}

/// Run the monitor for a little over two intervals: three ticks.
async fn run_three_ticks<R: SessionRefresher>(monitor: &SessionMonitor<R>) {
    monitor
        .run(tokio::time::sleep(Duration::from_secs(150)))
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_expiring_session_is_refreshed_once() {
    let refresher = FakeRefresher::new(Reply::Fresh);
    let user = UserId::random();
    let monitor = SessionMonitor::new(
        &refresher,
        settings(),
        Some(session_expiring_in(TimeDelta::minutes(1), user)),
    );
    let mut updates = monitor.subscribe();

    run_three_ticks(&monitor).await;

    assert_eq!(refresher.calls(), 1);
    assert!(updates.has_changed().unwrap_or(false));
    let session = updates.borrow_and_update().clone().expect("still signed in");
    assert_eq!(session.user.id, user);
    assert!(session.expires_in(chrono::Utc::now()) > TimeDelta::minutes(30));
}

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_is_retried_next_tick() {
    let refresher = FakeRefresher::new(Reply::Unreachable);
    let monitor = SessionMonitor::new(
        &refresher,
        settings(),
        Some(session_expiring_in(TimeDelta::minutes(1), UserId::random())),
    );

    run_three_ticks(&monitor).await;

    assert_eq!(refresher.calls(), 3);
    assert!(monitor.session().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_refused_refresh_signs_out() {
    let refresher = FakeRefresher::new(Reply::Refused);
    let monitor = SessionMonitor::new(
        &refresher,
        settings(),
        Some(session_expiring_in(TimeDelta::minutes(1), UserId::random())),
    );

    run_three_ticks(&monitor).await;

    assert_eq!(refresher.calls(), 1);
    assert!(monitor.session().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_fresh_session_is_left_alone() {
    let refresher = FakeRefresher::new(Reply::Fresh);
    let monitor = SessionMonitor::new(
        &refresher,
        settings(),
        Some(session_expiring_in(TimeDelta::hours(2), UserId::random())),
    );

    run_three_ticks(&monitor).await;

    assert_eq!(refresher.calls(), 0);
}

#[tokio::test]
async fn test_stored_session_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let user = UserId::random();
    let session = session_expiring_in(TimeDelta::hours(1), user);

    LocalStore::new(dir.path())
        .save(StoreKey::AuthSession, &session.to_stored())
        .await
        .expect("save");

    let reopened = LocalStore::new(dir.path());
    let stored: StoredSession = reopened
        .load(StoreKey::AuthSession)
        .await
        .expect("load")
        .expect("session present");
    let restored = AuthSession::from(stored);

    assert_eq!(restored.user, session.user);
    assert_eq!(restored.expires_at, session.expires_at);
    assert_eq!(
        restored.access_token.expose_secret(),
        session.access_token.expose_secret()
    );

    reopened.clear_all().await.expect("clear");
    let gone: Option<StoredSession> = reopened.load(StoreKey::AuthSession).await.expect("load");
    assert!(gone.is_none());
}
