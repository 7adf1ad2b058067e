//! Background session refresh.
//!
//! The monitor looks at the current session once per check interval. If the
//! access token expires within the refresh margin it makes exactly one
//! refresh attempt; a failure waits for the next tick. A refused refresh
//! (the refresh token itself is dead) clears the session so that the user is
//! asked to sign in again.

use std::future::Future;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::{AuthSession, SessionRefresher};
use crate::config::SessionSettings;
use crate::error::ErrorClass;

/// What a single check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Nobody is signed in.
    NoSession,
    /// Expiry is further away than the refresh margin.
    Fresh,
    /// The session was replaced with a refreshed one.
    Refreshed,
    /// The refresh failed; the session is kept and retried next tick.
    RefreshFailed,
    /// The refresh was refused; the session was cleared.
    Expired,
}

/// Keeps the current session fresh.
#[derive(Debug)]
pub struct SessionMonitor<R> {
    refresher: R,
    settings: SessionSettings,
    session: watch::Sender<Option<AuthSession>>,
}

impl<R: SessionRefresher> SessionMonitor<R> {
    #[must_use]
    pub fn new(refresher: R, settings: SessionSettings, initial: Option<AuthSession>) -> Self {
        let (session, _) = watch::channel(initial);
        Self {
            refresher,
            settings,
            session,
        }
    }

    /// Watch session changes (refreshes and sign-outs).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.session.subscribe()
    }

    /// Current session, if any.
    #[must_use]
    pub fn session(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    /// Replace the session, e.g. after sign-in or sign-out.
    pub fn set_session(&self, session: Option<AuthSession>) {
        self.session.send_replace(session);
    }

    /// Whether `session` is close enough to expiry to refresh at `now`.
    #[must_use]
    pub fn needs_refresh(&self, session: &AuthSession, now: DateTime<Utc>) -> bool {
        let margin = TimeDelta::from_std(self.settings.refresh_margin).unwrap_or(TimeDelta::MAX);
        session.expires_in(now) <= margin
    }

    /// Run one check at the current time.
    pub async fn check(&self) -> CheckOutcome {
        self.check_at(Utc::now()).await
    }

    /// Run one check as if the clock read `now`.
    #[tracing::instrument(skip(self))]
    pub async fn check_at(&self, now: DateTime<Utc>) -> CheckOutcome {
        let Some(current) = self.session() else {
            return CheckOutcome::NoSession;
        };
        if !self.needs_refresh(&current, now) {
            return CheckOutcome::Fresh;
        }

        match self.refresher.refresh(&current).await {
            Ok(refreshed) => {
                tracing::info!(expires_at = %refreshed.expires_at, "Session refreshed");
                self.session.send_replace(Some(refreshed));
                CheckOutcome::Refreshed
            }
            Err(e) if e.class() == ErrorClass::Authorization => {
                tracing::warn!(error = %e, "Session refresh refused, signing out");
                self.session.send_replace(None);
                CheckOutcome::Expired
            }
            Err(e) => {
                tracing::error!(error = %e, "Session refresh failed");
                CheckOutcome::RefreshFailed
            }
        }
    }

    /// Check once per interval until `shutdown` completes.
    ///
    /// The first check runs immediately. Missed ticks are skipped rather
    /// than bunched up.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.settings.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.check().await;
                }
            }
        }
        tracing::debug!("Session monitor stopped");
    }
}
