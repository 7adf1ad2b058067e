//! Hosted auth error types.

use thiserror::Error;

use crate::error::ErrorClass;
use crate::retry::{ErrorClassifier, Retryable};

/// Errors that can occur when talking to the hosted auth service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Connection failed or timed out.
    #[error("auth network error: {0}")]
    Network(String),

    /// HTTP request failed before a response arrived.
    #[error("auth request failed: {0}")]
    Request(String),

    /// Failed to parse the response body.
    #[error("auth response error: {0}")]
    Response(String),

    /// The service rejected the request.
    #[error("auth service error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Email or password is wrong.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// There is no session, or it can no longer be refreshed.
    #[error("session expired")]
    SessionExpired,

    /// Invalid URL built from configuration.
    #[error("invalid auth URL: {0}")]
    Url(#[from] url::ParseError),
}

impl AuthError {
    /// Classify for user-facing handling.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidCredentials
            | Self::SessionExpired
            | Self::Api {
                status: 401 | 403, ..
            } => ErrorClass::Authorization,
            Self::Api { status: 400 | 422, .. } => ErrorClass::Validation,
            _ if self.is_retryable() => ErrorClass::Transient,
            Self::Network(_)
            | Self::Request(_)
            | Self::Response(_)
            | Self::Api { .. }
            | Self::Url(_) => ErrorClass::Internal,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            Self::Network(e.to_string())
        } else if e.is_decode() {
            Self::Response(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

impl Retryable for AuthError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Request(message) => ErrorClassifier::shared().is_retryable(None, message),
            Self::Api { status, message } => {
                matches!(status, 429 | 502 | 503 | 504)
                    || ErrorClassifier::shared().is_retryable(None, message)
            }
            Self::Response(_)
            | Self::InvalidCredentials
            | Self::SessionExpired
            | Self::Url(_) => false,
        }
    }
}
