//! Realtime change feed and cache synchronisation.
//!
//! ```text
//! Postgres trigger ──NOTIFY salon_changes──▶ PgChangeFeed ──▶ ChangeHub (broadcast)
//!                                                                │
//!                                              RealtimeSync ◀────┘ one task per filter
//!                                                   │
//!                                                   ▼
//!                                          QueryInvalidator::invalidate_root
//! ```

pub mod feed;
pub mod sync;

pub use feed::{
    CHANGE_CHANNEL, ChangeEvent, ChangeFilter, ChangeHub, ChangeKind, EventFilter, FeedError,
    PgChangeFeed,
};
pub use sync::{RealtimeSync, WATCHED_TABLES, invalidation_targets};
