//! Error type system for the autocomplete service
//!
//! This module provides:
//! - A single error enum shared by handlers, middleware and verifiers
//! - HTTP status code mapping
//! - JSON error bodies carrying a trace ID

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use crate::api::middleware::current_trace_id;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Main error type for the autocomplete service
#[derive(Debug, thiserror::Error)]
pub enum AutocompleteError {
    // System-level errors
    #[error("System initialization failed: {0}")]
    InitializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // API-related errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid authentication credentials: {0}")]
    AuthenticationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),

    // I/O errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AutocompleteError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AutocompleteError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AutocompleteError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            AutocompleteError::NotFound(_) => StatusCode::NOT_FOUND,
            AutocompleteError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            AutocompleteError::InitializationError(_)
            | AutocompleteError::ConfigError(_)
            | AutocompleteError::Internal(_)
            | AutocompleteError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            AutocompleteError::InitializationError(_) => "InitializationError",
            AutocompleteError::ConfigError(_) => "ConfigError",
            AutocompleteError::InvalidRequest(_) => "InvalidRequest",
            AutocompleteError::AuthenticationError(_) => "AuthenticationError",
            AutocompleteError::NotFound(_) => "NotFound",
            AutocompleteError::Timeout(_) => "Timeout",
            AutocompleteError::Internal(_) => "Internal",
            AutocompleteError::IoError(_) => "IoError",
        }
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response
    ///
    /// Inside a request the trace ID is the one assigned by the trace middleware;
    /// elsewhere a fresh one is generated.
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            trace_id: current_trace_id().unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }

    /// Create an error response from an AutocompleteError
    pub fn from_error(error: &AutocompleteError) -> Self {
        Self::new(error.error_type().to_string(), error.to_string())
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (trace_id: {})", self.error, self.message, self.trace_id)
    }
}

impl IntoResponse for AutocompleteError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        if status_code.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::warn!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        let mut response = (status_code, Json(error_response)).into_response();
        if matches!(self, AutocompleteError::AuthenticationError(_)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Result type alias for operations that can fail with AutocompleteError
pub type Result<T> = std::result::Result<T, AutocompleteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AutocompleteError::InvalidRequest("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AutocompleteError::AuthenticationError("test".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AutocompleteError::NotFound("test".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AutocompleteError::ConfigError("test".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_response_creation() {
        let error = AutocompleteError::AuthenticationError("token expired".into());
        let response = ErrorResponse::from_error(&error);

        assert_eq!(response.error, "AuthenticationError");
        assert!(response.message.contains("token expired"));
        assert!(!response.trace_id.is_empty());
    }

    #[test]
    fn test_authentication_error_sets_www_authenticate() {
        let response = AutocompleteError::AuthenticationError("missing".into()).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_other_errors_have_no_challenge() {
        let response = AutocompleteError::InvalidRequest("bad".into()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
