//! Unified error handling for the portal API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use salon_core::UserId;

use crate::db::RepositoryError;
use crate::gate::AccessDenied;
use crate::local_store::LocalStoreError;
use crate::realtime::FeedError;
use crate::retry::Retryable;
use crate::services::auth::AuthError;
use crate::services::validation::ValidationError;

/// How a failure is handled and shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Network hiccups, serialization conflicts, rate limits. Retried.
    Transient,
    /// No session or an expired one. The user has to sign in again.
    Authorization,
    /// The role does not allow the action.
    PermissionDenied,
    /// The input was rejected.
    Validation,
    NotFound,
    Internal,
}

/// Application-level error type for the portal API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Hosted auth call failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Input was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("{0}")]
    Forbidden(AccessDenied),

    /// The caller's role has not been resolved yet.
    #[error("Role is still loading")]
    RolePending,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LocalStoreError> for AppError {
    fn from(e: LocalStoreError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<FeedError> for AppError {
    fn from(e: FeedError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl AppError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Database(e) => e.class(),
            Self::Auth(e) => e.class(),
            Self::Validation(_) | Self::BadRequest(_) => ErrorClass::Validation,
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::Unauthorized(_) => ErrorClass::Authorization,
            Self::Forbidden(_) => ErrorClass::PermissionDenied,
            Self::RolePending => ErrorClass::Transient,
            Self::Internal(_) => ErrorClass::Internal,
        }
    }

    fn status(&self) -> StatusCode {
        match (self, self.class()) {
            (Self::BadRequest(_), _) => StatusCode::BAD_REQUEST,
            (Self::Database(RepositoryError::Conflict(_)), _) => StatusCode::CONFLICT,
            (Self::Auth(_), ErrorClass::Internal) => StatusCode::BAD_GATEWAY,
            (_, ErrorClass::Transient) => StatusCode::SERVICE_UNAVAILABLE,
            (_, ErrorClass::Authorization) => StatusCode::UNAUTHORIZED,
            (_, ErrorClass::PermissionDenied) => StatusCode::FORBIDDEN,
            (_, ErrorClass::Validation) => StatusCode::UNPROCESSABLE_ENTITY,
            (_, ErrorClass::NotFound) => StatusCode::NOT_FOUND,
            (_, ErrorClass::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller.
    fn public_message(&self) -> String {
        match (self, self.class()) {
            (_, ErrorClass::Internal) => "Internal server error".to_string(),
            (_, ErrorClass::Transient) => {
                "Service temporarily unavailable, please try again".to_string()
            }
            (Self::Auth(_) | Self::Unauthorized(_), ErrorClass::Authorization) => {
                "Your session has expired. Please sign in again.".to_string()
            }
            (Self::Database(RepositoryError::NotFound), _) => "Not found".to_string(),
            _ => self.to_string(),
        }
    }
}

impl Retryable for AppError {
    fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let class = self.class();

        // Log server errors with Sentry
        if matches!(class, ErrorClass::Internal | ErrorClass::Transient)
            && !matches!(self, Self::RolePending)
        {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Portal request error"
            );
        }

        let body = Json(json!({
            "error": self.public_message(),
            "class": class,
        }));
        (self.status(), body).into_response()
    }
}

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: UserId, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
