//! Command implementations.

pub mod migrate;
pub mod roles;
pub mod session;
pub mod staff;
pub mod watch;

use thiserror::Error;

use salon_portal::config::ConfigError;
use salon_portal::db::RepositoryError;
use salon_portal::local_store::LocalStoreError;
use salon_portal::realtime::FeedError;
use salon_portal::services::auth::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Local state error: {0}")]
    LocalStore(#[from] LocalStoreError),

    #[error("Change feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Not signed in. Run `salon login` first.")]
    NotSignedIn,
}
