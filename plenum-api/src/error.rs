//! Error types for the Plenum API.
//!
//! Every handler failure is serialized as JSON with a machine-readable code
//! and an HTTP status derived from it. Engine errors map onto API codes in
//! one place so handlers just use `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use plenum_core::{PlenumError, ReviewError, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request is authenticated but lacks permission for the resource.
    Forbidden,

    /// Request contains invalid input data.
    InvalidInput,

    /// Requested review session does not exist.
    SessionNotFound,

    /// Requested reviewable item does not exist.
    ItemNotFound,

    /// Some other referenced entity does not exist.
    EntityNotFound,

    /// Operation conflicts with current state.
    StateConflict,

    /// Internal server error.
    InternalError,

    /// Service is temporarily unavailable.
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::SessionNotFound
            | ErrorCode::ItemNotFound
            | ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,
            ErrorCode::StateConflict => StatusCode::CONFLICT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

// ============================================================================
// API ERROR
// ============================================================================

/// Structured error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn session_not_found(id: Uuid) -> Self {
        Self::new(
            ErrorCode::SessionNotFound,
            format!("Review session {} not found", id),
        )
    }

    pub fn item_not_found(id: Uuid) -> Self {
        Self::new(ErrorCode::ItemNotFound, format!("Item {} not found", id))
    }

    pub fn entity_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityNotFound, message)
    }

    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StateConflict, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, message = %self.message, "API error");
        }
        (status, Json(self)).into_response()
    }
}

impl From<PlenumError> for ApiError {
    fn from(error: PlenumError) -> Self {
        match &error {
            PlenumError::Storage(StorageError::NotFound { .. }) => {
                Self::entity_not_found(error.to_string())
            }
            PlenumError::Review(ReviewError::UnknownItem { item_id }) => {
                Self::item_not_found(*item_id)
            }
            PlenumError::Review(
                ReviewError::UnknownDecision { .. }
                | ReviewError::UnknownCategory { .. }
                | ReviewError::ForeignScoreOption { .. },
            ) => Self::invalid_input(error.to_string()),
            // An unregistered session type or a mismatched adapter is a
            // programming error, not a client mistake.
            PlenumError::Review(
                ReviewError::UnregisteredSessionType { .. }
                | ReviewError::SessionTypeMismatch { .. },
            ) => Self::internal_error(error.to_string()),
            PlenumError::Storage(_) | PlenumError::Cache(_) => {
                Self::new(ErrorCode::ServiceUnavailable, error.to_string())
            }
            PlenumError::Analysis(_) | PlenumError::Config(_) => {
                Self::internal_error(error.to_string())
            }
        }
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// TESTS
// =============================================================================
