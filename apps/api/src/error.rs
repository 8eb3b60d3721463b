//! Error handling for the Loopcast API
//!
//! A unified error type hierarchy using thiserror, with automatic HTTP
//! status code mapping via Axum's IntoResponse trait.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for client-side handling
    pub code: &'static str,
    /// Human-readable error message
    pub message: String,
}

/// Main API error type
#[derive(Error, Debug)]
pub enum ApiError {
    // ========== Authentication & Authorization ==========
    /// Invalid or missing authentication credentials
    #[error("authentication required")]
    Unauthorized,

    /// Invalid token (expired, malformed, etc.)
    #[error("invalid authentication token: {0}")]
    InvalidToken(String),

    /// User lacks permission for the requested operation
    #[error("insufficient permissions: {0}")]
    Forbidden(String),

    // ========== Resource Errors ==========
    /// Requested resource not found
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Resource already exists (conflict)
    #[error("{resource_type} already exists: {id}")]
    Conflict {
        resource_type: &'static str,
        id: String,
    },

    // ========== Validation Errors ==========
    /// Request validation failed
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Invalid request body format
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Uploaded file has an unsupported container format
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    // ========== Infrastructure Errors ==========
    /// Database query failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Queue operation failed
    #[error("queue error: {0}")]
    Queue(#[from] loopcast_queue::QueueError),

    /// Uploaded or derived file not found on disk
    #[error("audio file not found: {0}")]
    AudioFileNotFound(String),

    /// File storage operation failed
    #[error("storage error: {0}")]
    Storage(String),

    // ========== Configuration Errors ==========
    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    // ========== Internal Errors ==========
    /// Internal server error (catch-all for unexpected errors)
    #[error("internal server error: {0}")]
    Internal(String),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// WebSocket error
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// JWT encoding/decoding error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 401 Unauthorized
            Self::Unauthorized | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::Forbidden(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            Self::NotFound { .. } | Self::AudioFileNotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::Conflict { .. } => StatusCode::CONFLICT,

            // 400 Bad Request
            Self::ValidationError(_)
            | Self::InvalidBody(_)
            | Self::MissingField(_)
            | Self::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,

            // 422 Unprocessable Entity
            Self::Serialization(_) => StatusCode::UNPROCESSABLE_ENTITY,

            // 500 Internal Server Error
            Self::Database(_)
            | Self::Queue(_)
            | Self::Storage(_)
            | Self::Configuration(_)
            | Self::Internal(_)
            | Self::WebSocket(_)
            | Self::Jwt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for client-side handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Queue(_) => "QUEUE_ERROR",
            Self::AudioFileNotFound(_) => "AUDIO_NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::WebSocket(_) => "WEBSOCKET_ERROR",
            Self::Jwt(_) => "JWT_ERROR",
        }
    }

    /// Create a not found error for a specific resource
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// Create a conflict error for a specific resource
    pub fn conflict(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::Conflict {
            resource_type,
            id: id.into(),
        }
    }

    /// Log the error with severity matched to its status code
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Server error occurred"
            );
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Authorization error"
            );
        } else {
            tracing::debug!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Client error"
            );
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::AudioFileNotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                Self::Forbidden("file access denied".to_string())
            }
            _ => Self::Storage(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::not_found("loop", "123").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::ValidationError("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::UnsupportedFormat("webm".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::Unauthorized.error_code(), "UNAUTHORIZED");
        assert_eq!(ApiError::not_found("loop", "123").error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::not_found("loop", "abc123");
        assert_eq!(err.to_string(), "loop not found: abc123");
    }
}
