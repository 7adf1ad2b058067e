//! Database migration command.
//!
//! # Environment Variables
//!
//! - `SALON_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/portal/migrations/`, applied in filename order.

use salon_portal::config::database_url_from_env;
use salon_portal::db::create_pool;

use super::CliError;

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to salon database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running salon migrations...");
    sqlx::migrate!("../portal/migrations").run(&pool).await?;

    tracing::info!("Salon migrations complete!");
    Ok(())
}
