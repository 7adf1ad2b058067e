//! Role assignment commands.
//!
//! # Environment Variables
//!
//! - `SALON_DATABASE_URL` - `PostgreSQL` connection string

use salon_core::{Role, UserId};
use salon_portal::config::database_url_from_env;
use salon_portal::db::{UserRoleRepository, create_pool};

use super::CliError;

/// Assign `role` to `user`.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or the write fails.
#[allow(clippy::print_stdout)]
pub async fn grant(user: UserId, role: Role) -> Result<(), CliError> {
    let pool = create_pool(&database_url_from_env()?).await?;

    UserRoleRepository::new(&pool).assign(user, role).await?;
    tracing::info!(%user, %role, "Role assigned");
    println!("{user} is now {}", role.info().label);
    Ok(())
}

/// Print every role assignment.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), CliError> {
    let pool = create_pool(&database_url_from_env()?).await?;

    let assignments = UserRoleRepository::new(&pool).list().await?;
    if assignments.is_empty() {
        println!("No roles assigned.");
    }
    for (user, role) in assignments {
        println!("{:<13} {user}", role.as_str());
    }
    Ok(())
}
