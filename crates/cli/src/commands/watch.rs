//! `salon watch`: a long-running staff client.
//!
//! Keeps the stored session fresh, listens to the change feed, prints every
//! invalidated query root, and rewrites the offline copy of today's
//! schedule whenever appointments change. Stops on Ctrl+C or when the
//! session can no longer be refreshed.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;

use salon_portal::cache::{QueryInvalidator, QueryRoot};
use salon_portal::config::{
    AuthConfig, SessionSettings, database_url_from_env, retry_policy_from_env,
};
use salon_portal::db::{AppointmentRepository, create_pool};
use salon_portal::local_store::{LocalStore, ScheduleCache, StoreKey};
use salon_portal::realtime::{ChangeHub, PgChangeFeed, RealtimeSync};
use salon_portal::retry::RetryPolicy;
use salon_portal::services::auth::{AuthClient, SessionMonitor};
use salon_portal::services::validation::day_bounds;

use super::CliError;
use super::session::{load_session, local_store};

/// Reacts to invalidations by reporting them and refreshing the local
/// schedule copy.
struct ScheduleRefresher {
    pool: PgPool,
    store: LocalStore,
    retry: RetryPolicy,
}

impl ScheduleRefresher {
    async fn refresh_today(&self) {
        let today = Utc::now().date_naive();
        let (from, to) = match day_bounds(today) {
            Ok(bounds) => bounds,
            Err(e) => {
                tracing::error!(error = %e, "Failed to refresh today's schedule");
                return;
            }
        };
        let repo = AppointmentRepository::new(&self.pool);

        let appointments = match self.retry.run(|| repo.list_between(from, to)).await {
            Ok(appointments) => appointments,
            Err(e) => {
                tracing::error!(error = %e, "Failed to refresh today's schedule");
                return;
            }
        };

        let count = appointments.len();
        let cache = ScheduleCache {
            date: today,
            fetched_at: Utc::now(),
            appointments,
        };
        match self.store.save(StoreKey::ScheduleCache, &cache).await {
            Ok(()) => tracing::info!(%today, count, "Schedule cache updated"),
            Err(e) => tracing::error!(error = %e, "Failed to write schedule cache"),
        }
    }
}

impl QueryInvalidator for ScheduleRefresher {
    #[allow(clippy::print_stdout)]
    async fn invalidate_root(&self, root: QueryRoot) {
        println!("invalidated {root}");
        if root == QueryRoot::TodayAppointments {
            self.refresh_today().await;
        }
    }
}

/// Run until Ctrl+C or until the session expires.
///
/// # Errors
///
/// Returns `CliError::NotSignedIn` without a stored session, or the error
/// from connecting to the database.
#[allow(clippy::print_stdout)]
pub async fn run() -> Result<(), CliError> {
    let store = local_store();
    let session = load_session(&store).await?;

    let monitor = SessionMonitor::new(
        AuthClient::new(&AuthConfig::from_env()?),
        SessionSettings::from_env()?,
        Some(session),
    );

    let pool = create_pool(&database_url_from_env()?).await?;
    let hub = ChangeHub::default();
    let feed = PgChangeFeed::connect(&pool).await?.spawn(hub.clone());

    let refresher = Arc::new(ScheduleRefresher {
        pool,
        store: store.clone(),
        retry: retry_policy_from_env()?,
    });
    refresher.refresh_today().await;
    let sync = RealtimeSync::start(&hub, Arc::clone(&refresher), RealtimeSync::default_filters());
    println!("Watching {} tables. Press Ctrl+C to stop.", sync.subscription_count());

    let mut sessions = monitor.subscribe();
    let persist = async {
        while sessions.changed().await.is_ok() {
            let current = sessions.borrow_and_update().clone();
            let Some(session) = current else {
                break;
            };
            if let Err(e) = store.save(StoreKey::AuthSession, &session.to_stored()).await {
                tracing::error!(error = %e, "Failed to persist refreshed session");
            }
        }
    };

    let signed_out = tokio::select! {
        () = monitor.run(ctrl_c()) => false,
        () = persist => true,
    };

    sync.close();
    feed.abort();

    if signed_out {
        store.clear_all().await?;
        println!("Session expired. Run `salon login` to sign in again.");
    }
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
