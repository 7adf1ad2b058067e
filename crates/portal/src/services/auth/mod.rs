//! Hosted auth client.
//!
//! Talks to a GoTrue-compatible token API: password sign-in, refresh-token
//! exchange, user lookup and sign-out. Every request carries the project's
//! anon key in the `apikey` header.

mod error;
mod monitor;

pub use error::AuthError;
pub use monitor::{CheckOutcome, SessionMonitor};

use std::future::Future;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use salon_core::{Email, UserId};

use crate::config::AuthConfig;

/// The signed-in user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone)]
pub struct AuthSession {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

impl AuthSession {
    /// Time left before the access token expires. Negative once expired.
    #[must_use]
    pub fn expires_in(&self, now: DateTime<Utc>) -> TimeDelta {
        self.expires_at - now
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Plain form for the local store.
    #[must_use]
    pub fn to_stored(&self) -> StoredSession {
        StoredSession {
            access_token: self.access_token.expose_secret().to_string(),
            refresh_token: self.refresh_token.expose_secret().to_string(),
            expires_at: self.expires_at,
            user: self.user.clone(),
        }
    }
}

/// Session as written to local state.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredSession {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
    user: AuthUser,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl From<StoredSession> for AuthSession {
    fn from(stored: StoredSession) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            refresh_token: SecretString::from(stored.refresh_token),
            expires_at: stored.expires_at,
            user: stored.user,
        }
    }
}

/// Exchanges a session for a fresh one.
pub trait SessionRefresher: Send + Sync {
    fn refresh(
        &self,
        session: &AuthSession,
    ) -> impl Future<Output = Result<AuthSession, AuthError>> + Send;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    /// Absolute `expires_at` wins; otherwise `expires_in` counts from `now`.
    fn into_session(self, now: DateTime<Utc>) -> Result<AuthSession, AuthError> {
        let expires_at = match self.expires_at.and_then(|secs| DateTime::from_timestamp(secs, 0)) {
            Some(at) => at,
            None => TimeDelta::try_seconds(self.expires_in)
                .and_then(|delta| now.checked_add_signed(delta))
                .ok_or_else(|| {
                    AuthError::Response(format!("expires_in out of range: {}", self.expires_in))
                })?,
        };
        Ok(AuthSession {
            access_token: SecretString::from(self.access_token),
            refresh_token: SecretString::from(self.refresh_token),
            expires_at,
            user: self.user,
        })
    }
}

/// Error bodies vary between endpoints; take whichever message is present.
#[derive(Deserialize, Default)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    fn message(self) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// Client for the hosted auth service.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: Url,
    anon_key: SecretString,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("base_url", &self.base_url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut base_url = config.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client: Client::new(),
            base_url,
            anon_key: config.anon_key.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        Ok(self.base_url.join(path)?)
    }

    fn token_endpoint(&self, grant_type: &str) -> Result<Url, AuthError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong email or password,
    /// other variants for transport or service failures.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(self.token_endpoint("password")?)
            .header("apikey", self.anon_key.expose_secret())
            .json(&PasswordGrant {
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let session = read_token(response, AuthError::InvalidCredentials).await?;
        debug!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` if the refresh token is no longer
    /// valid.
    #[instrument(skip_all)]
    pub async fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(self.token_endpoint("refresh_token")?)
            .header("apikey", self.anon_key.expose_secret())
            .json(&RefreshGrant {
                refresh_token: refresh_token.expose_secret(),
            })
            .send()
            .await?;

        let session = read_token(response, AuthError::SessionExpired).await?;
        debug!(user_id = %session.user.id, expires_at = %session.expires_at, "Session refreshed");
        Ok(session)
    }

    /// Look up the user an access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &SecretString) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::SessionExpired);
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// Revoke the session server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. An already expired session is
    /// not an error.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &SecretString) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.endpoint("auth/v1/logout")?)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        Err(api_error(response).await)
    }
}

impl SessionRefresher for AuthClient {
    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, AuthError> {
        self.refresh_session(&session.refresh_token).await
    }
}

/// Parse a token response. `rejected` is returned for a 400/401 from the
/// token endpoint, which means the grant itself was refused.
async fn read_token(response: Response, rejected: AuthError) -> Result<AuthSession, AuthError> {
    let status = response.status();
    if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
        let body: ErrorBody = response.json().await.unwrap_or_default();
        warn!(status = status.as_u16(), reason = %body.message(), "Token grant rejected");
        return Err(rejected);
    }
    if !status.is_success() {
        return Err(api_error(response).await);
    }
    let token: TokenResponse = response.json().await?;
    token.into_session(Utc::now())
}

async fn api_error(response: Response) -> AuthError {
    let status = response.status().as_u16();
    let message = response
        .json::<ErrorBody>()
        .await
        .unwrap_or_default()
        .message();
    AuthError::Api { status, message }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::retry::Retryable;

    fn client(url: &str) -> AuthClient {
        AuthClient::new(&AuthConfig {
            url: Url::parse(url).unwrap(),
            anon_key: SecretString::from("anon"),
        })
    }

    #[test]
    fn test_token_endpoint() {
        let url = client("https://salon.example.co")
            .token_endpoint("password")
            .unwrap();
        assert_eq!(url.as_str(), "https://salon.example.co/auth/v1/token?grant_type=password");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = client("http://localhost:54321/project")
            .endpoint("auth/v1/user")
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:54321/project/auth/v1/user");
    }

    #[test]
    fn test_token_response_prefers_absolute_expiry() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "expires_at": 1_800_000_000,
            "user": { "id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "email": "sam@salon.test" }
        }))
        .unwrap();
        let session = token.into_session(Utc::now()).unwrap();
        assert_eq!(session.expires_at.timestamp(), 1_800_000_000);
    }

    #[test]
    fn test_token_response_relative_expiry() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": { "id": "67e55044-10b1-426f-9247-bb680e5fe0c8" }
        }))
        .unwrap();
        let now = Utc::now();
        let session = token.into_session(now).unwrap();
        assert_eq!(session.expires_in(now), TimeDelta::seconds(3600));
    }

    #[test]
    fn test_token_response_expiry_overflow_is_an_error() {
        for expires_in in [9_000_000_000_000_000_i64, i64::MIN, -9_000_000_000_000] {
            let token: TokenResponse = serde_json::from_value(serde_json::json!({
                "access_token": "a",
                "refresh_token": "r",
                "expires_in": expires_in,
                "user": { "id": "67e55044-10b1-426f-9247-bb680e5fe0c8" }
            }))
            .unwrap();
            let err = token.into_session(Utc::now()).err().unwrap();
            assert!(matches!(err, AuthError::Response(_)), "{expires_in}: {err:?}");
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_error_body_message_precedence() {
        let body: ErrorBody = serde_json::from_value(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        }))
        .unwrap();
        assert_eq!(body.message(), "Invalid login credentials");
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let session = AuthSession {
            access_token: SecretString::from("access-secret"),
            refresh_token: SecretString::from("refresh-secret"),
            expires_at: Utc::now(),
            user: AuthUser {
                id: UserId::random(),
                email: None,
            },
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("access-secret"));
        assert!(!debug.contains("refresh-secret"));

        let stored = format!("{:?}", session.to_stored());
        assert!(!stored.contains("access-secret"));
    }
}
