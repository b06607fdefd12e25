//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and the JSON
//! error body every handler responds with.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use food_share_core::{AuthFailure, LifecycleError, PortError};
use serde::Serialize;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure applying the schema migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

//=========================================================================================
// HTTP Error Responses
//=========================================================================================

/// The body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// A handler error: a status code plus an `ErrorBody`.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl HttpError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad-request", message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", "Sign in required")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<LifecycleError> for HttpError {
    fn from(e: LifecycleError) -> Self {
        let message = e.to_string();
        match e {
            LifecycleError::Validation { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "validation", message)
            }
            LifecycleError::Authorization(_) => {
                Self::new(StatusCode::FORBIDDEN, "authorization", message)
            }
            LifecycleError::State { .. } => Self::new(StatusCode::CONFLICT, "state", message),
            LifecycleError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "not-found", message),
            LifecycleError::Fetch(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "fetch", message)
            }
            LifecycleError::Write(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "write", message)
            }
        }
    }
}

impl From<PortError> for HttpError {
    fn from(e: PortError) -> Self {
        let message = e.to_string();
        match e {
            PortError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "not-found", message),
            PortError::Conflict(_) => Self::new(StatusCode::CONFLICT, "conflict", message),
            PortError::Unauthorized => Self::unauthorized(),
            PortError::Unexpected(_) => Self::internal(message),
        }
    }
}

impl From<AuthFailure> for HttpError {
    fn from(e: AuthFailure) -> Self {
        let status = match e {
            AuthFailure::InvalidEmail | AuthFailure::WeakPassword => StatusCode::BAD_REQUEST,
            AuthFailure::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthFailure::UserDisabled => StatusCode::FORBIDDEN,
            AuthFailure::EmailInUse => StatusCode::CONFLICT,
            AuthFailure::Network(_) | AuthFailure::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.code(), e.user_message())
    }
}
