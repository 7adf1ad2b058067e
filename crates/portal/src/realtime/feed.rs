//! Row-change notifications.
//!
//! A trigger on every watched table sends `NOTIFY salon_changes` with a JSON
//! payload such as `{"table":"appointments","type":"UPDATE","id":"…"}`.
//! [`PgChangeFeed`] listens on that channel and republishes each event on a
//! [`ChangeHub`], which fans out to any number of in-process subscribers.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// `LISTEN` channel the notify trigger publishes on.
pub const CHANGE_CHANNEL: &str = "salon_changes";

/// Default number of buffered events per subscriber.
const DEFAULT_CAPACITY: usize = 256;

/// Pause after a failed receive before listening again.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Errors from the change feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("listener error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed change payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("unknown event type: {0}")]
    UnknownEvent(String),
}

/// What happened to the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which change kinds a subscription wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    /// `*`
    #[default]
    All,
    Only(ChangeKind),
}

impl EventFilter {
    #[must_use]
    pub fn matches(self, kind: ChangeKind) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == kind,
        }
    }
}

impl FromStr for EventFilter {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "*" => Ok(Self::All),
            "INSERT" => Ok(Self::Only(ChangeKind::Insert)),
            "UPDATE" => Ok(Self::Only(ChangeKind::Update)),
            "DELETE" => Ok(Self::Only(ChangeKind::Delete)),
            _ => Err(FeedError::UnknownEvent(s.to_string())),
        }
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Only(kind) => kind.fmt(f),
        }
    }
}

/// One row change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub id: Option<Uuid>,
}

impl ChangeEvent {
    #[must_use]
    pub fn new(table: impl Into<String>, kind: ChangeKind, id: Option<Uuid>) -> Self {
        Self {
            table: table.into(),
            kind,
            id,
        }
    }

    /// Parse a notification payload.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Payload` for anything that is not a change event.
    pub fn from_payload(payload: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// A subscription: one table and the change kinds of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    pub table: String,
    pub event: EventFilter,
}

impl ChangeFilter {
    /// Every change on `table`.
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            event: EventFilter::All,
        }
    }

    /// Only `event` changes on `table`.
    #[must_use]
    pub fn new(table: impl Into<String>, event: EventFilter) -> Self {
        Self {
            table: table.into(),
            event,
        }
    }

    #[must_use]
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.table == event.table && self.event.matches(event.kind)
    }
}

impl fmt::Display for ChangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table, self.event)
    }
}

/// In-process fan-out of change events.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeHub {
    /// Create a hub buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Returns how many subscribers will see it.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Bridges `LISTEN salon_changes` onto a [`ChangeHub`].
pub struct PgChangeFeed {
    listener: PgListener,
}

impl fmt::Debug for PgChangeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgChangeFeed")
            .field("channel", &CHANGE_CHANNEL)
            .finish_non_exhaustive()
    }
}

impl PgChangeFeed {
    /// Open a dedicated listener connection and `LISTEN` on the channel.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Database` if the connection or `LISTEN` fails.
    pub async fn connect(pool: &PgPool) -> Result<Self, FeedError> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        tracing::info!(channel = CHANGE_CHANNEL, "Listening for row changes");
        Ok(Self { listener })
    }

    /// Pump notifications into `hub` until the task is aborted.
    ///
    /// Malformed payloads are logged and skipped. Receive errors are logged;
    /// the listener reconnects on its next receive.
    #[must_use]
    pub fn spawn(mut self, hub: ChangeHub) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.listener.recv().await {
                    Ok(notification) => match ChangeEvent::from_payload(notification.payload()) {
                        Ok(event) => {
                            tracing::debug!(table = %event.table, kind = %event.kind, "Row change");
                            hub.publish(event);
                        }
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                payload = notification.payload(),
                                "Ignoring change notification"
                            );
                        }
                    },
                    Err(e) => {
                        tracing::error!(error = %e, "Change feed receive failed");
                        tokio::time::sleep(RECEIVE_ERROR_BACKOFF).await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        let event = ChangeEvent::from_payload(
            r#"{"table":"appointments","type":"UPDATE","id":"67e55044-10b1-426f-9247-bb680e5fe0c8"}"#,
        )
        .unwrap();
        assert_eq!(event.table, "appointments");
        assert_eq!(event.kind, ChangeKind::Update);
        assert!(event.id.is_some());
    }

    #[test]
    fn test_parse_payload_without_id() {
        let event =
            ChangeEvent::from_payload(r#"{"table":"user_roles","type":"DELETE","id":null}"#)
                .unwrap();
        assert_eq!(event.id, None);
    }

    #[test]
    fn test_reject_unknown_kind() {
        assert!(ChangeEvent::from_payload(r#"{"table":"clients","type":"TRUNCATE"}"#).is_err());
        assert!("TRUNCATE".parse::<EventFilter>().is_err());
    }

    #[test]
    fn test_filter_matching() {
        let insert = ChangeEvent::new("clients", ChangeKind::Insert, None);
        let delete = ChangeEvent::new("clients", ChangeKind::Delete, None);

        assert!(ChangeFilter::table("clients").matches(&delete));
        assert!(!ChangeFilter::table("staff").matches(&insert));

        let inserts_only = ChangeFilter::new("clients", "insert".parse().unwrap());
        assert!(inserts_only.matches(&insert));
        assert!(!inserts_only.matches(&delete));
    }

    #[tokio::test]
    async fn test_hub_fans_out() {
        let hub = ChangeHub::new(8);
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        let delivered = hub.publish(ChangeEvent::new("services", ChangeKind::Insert, None));

        assert_eq!(delivered, 2);
        assert_eq!(a.recv().await.unwrap().table, "services");
        assert_eq!(b.recv().await.unwrap().table, "services");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let hub = ChangeHub::default();
        assert_eq!(hub.publish(ChangeEvent::new("staff", ChangeKind::Update, None)), 0);
    }
}
