//! Staff sign-in commands.
//!
//! The session lives in the local store under `salon-auth-session` and is
//! removed, along with every other local key, on logout.
//!
//! # Environment Variables
//!
//! - `SALON_AUTH_URL`, `SALON_AUTH_ANON_KEY` - Hosted auth service
//! - `SALON_LOCAL_STATE_DIR` - Where local state is kept (default: .salon)
//! - `SALON_DATABASE_URL` - Optional; `whoami` shows the role when set

use chrono::Utc;
use secrecy::SecretString;

use salon_core::{Email, PermissionArea};
use salon_portal::config::{
    AuthConfig, SessionSettings, database_url_from_env, local_state_dir_from_env,
    retry_policy_from_env,
};
use salon_portal::db::{UserRoleRepository, create_pool};
use salon_portal::local_store::{LocalStore, StoreKey};
use salon_portal::permissions::RoleResolver;
use salon_portal::services::auth::{
    AuthClient, AuthSession, CheckOutcome, SessionMonitor, StoredSession,
};

use super::CliError;

/// The local store at `SALON_LOCAL_STATE_DIR`.
pub fn local_store() -> LocalStore {
    LocalStore::new(local_state_dir_from_env())
}

/// The stored session.
///
/// # Errors
///
/// Returns `CliError::NotSignedIn` if there is none.
pub async fn load_session(store: &LocalStore) -> Result<AuthSession, CliError> {
    let stored: Option<StoredSession> = store.load(StoreKey::AuthSession).await?;
    stored.map(AuthSession::from).ok_or(CliError::NotSignedIn)
}

/// Sign in with email and password and store the session.
///
/// # Errors
///
/// Returns `CliError::Auth` for bad credentials or an unreachable service.
#[allow(clippy::print_stdout)]
pub async fn login(email: &str, password: &SecretString) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::InvalidEmail(e.to_string()))?;
    let client = AuthClient::new(&AuthConfig::from_env()?);
    let retry = retry_policy_from_env()?;

    let session = retry
        .run(|| client.sign_in_with_password(&email, password))
        .await?;
    local_store()
        .save(StoreKey::AuthSession, &session.to_stored())
        .await?;

    tracing::info!(user_id = %session.user.id, "Signed in");
    println!("Signed in as {email} (session expires {})", session.expires_at);
    Ok(())
}

/// Sign out and clear all local state.
///
/// Local state is cleared even if the auth service cannot be reached.
///
/// # Errors
///
/// Returns `CliError::LocalStore` if local files cannot be removed.
#[allow(clippy::print_stdout)]
pub async fn logout() -> Result<(), CliError> {
    let store = local_store();

    match load_session(&store).await {
        Ok(session) => {
            let client = AuthClient::new(&AuthConfig::from_env()?);
            if let Err(e) = client.sign_out(&session.access_token).await {
                tracing::warn!(error = %e, "Remote sign-out failed, clearing local state anyway");
            }
        }
        Err(CliError::NotSignedIn) => {}
        Err(e) => tracing::warn!(error = %e, "Stored session unreadable, clearing local state"),
    }

    store.clear_all().await?;
    println!("Signed out.");
    Ok(())
}

/// Show the signed-in user, refreshing the session first if it is close to
/// expiry, and their role when a database is configured.
///
/// # Errors
///
/// Returns `CliError::NotSignedIn` without a stored session or when the
/// refresh token was refused.
#[allow(clippy::print_stdout)]
pub async fn whoami() -> Result<(), CliError> {
    let store = local_store();
    let session = load_session(&store).await?;
    let client = AuthClient::new(&AuthConfig::from_env()?);

    let monitor = SessionMonitor::new(client.clone(), SessionSettings::from_env()?, Some(session));
    match monitor.check().await {
        CheckOutcome::Refreshed => {
            if let Some(session) = monitor.session() {
                store
                    .save(StoreKey::AuthSession, &session.to_stored())
                    .await?;
            }
        }
        CheckOutcome::Expired | CheckOutcome::NoSession => {
            store.clear_all().await?;
            return Err(CliError::NotSignedIn);
        }
        CheckOutcome::Fresh | CheckOutcome::RefreshFailed => {}
    }
    let session = monitor.session().ok_or(CliError::NotSignedIn)?;

    let user = client.get_user(&session.access_token).await?;
    println!("User:    {}", user.id);
    if let Some(email) = &user.email {
        println!("Email:   {email}");
    }
    let remaining = session.expires_in(Utc::now());
    println!("Session: expires {} ({} min)", session.expires_at, remaining.num_minutes());

    let Ok(database_url) = database_url_from_env() else {
        return Ok(());
    };
    let pool = create_pool(&database_url).await?;
    let resolver = RoleResolver::new();
    let permissions = resolver
        .resolve(&UserRoleRepository::new(&pool), user.id, &retry_policy_from_env()?)
        .await?;

    match permissions.role() {
        Some(role) => {
            let info = role.info();
            println!("Role:    {} - {}", info.label, info.description);
            let areas: Vec<&str> = permissions
                .accessible_areas()
                .into_iter()
                .map(PermissionArea::as_str)
                .collect();
            println!("Access:  {}", areas.join(", "));
        }
        None => println!("Role:    none assigned"),
    }
    Ok(())
}
