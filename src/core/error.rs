//! Error type system for the Jijue LMS backend
//!
//! This module provides:
//! - A domain error taxonomy with HTTP status code mapping
//! - JSON error responses carrying a trace ID
//! - A context extension trait for wrapping foreign errors

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Main error type for the LMS backend
#[derive(Debug, thiserror::Error)]
pub enum LmsError {
    // System-level errors
    #[error("System initialization failed: {0}")]
    InitializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task error: {0}")]
    TaskError(String),

    // Request-level errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    // Deliberately undifferentiated: the same error covers unknown email
    // and wrong password to prevent account enumeration.
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl LmsError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            LmsError::InvalidRequest(_) | LmsError::DuplicateEmail(_) => StatusCode::BAD_REQUEST,

            LmsError::InvalidCredentials | LmsError::InvalidToken(_) => StatusCode::UNAUTHORIZED,

            LmsError::PermissionDenied(_) => StatusCode::FORBIDDEN,

            LmsError::NotFound(_) => StatusCode::NOT_FOUND,

            LmsError::InitializationError(_)
            | LmsError::ConfigError(_)
            | LmsError::DatabaseError(_)
            | LmsError::IoError(_)
            | LmsError::TaskError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            LmsError::InitializationError(_) => "InitializationError",
            LmsError::ConfigError(_) => "ConfigError",
            LmsError::DatabaseError(_) => "DatabaseError",
            LmsError::IoError(_) => "IoError",
            LmsError::TaskError(_) => "TaskError",
            LmsError::InvalidRequest(_) => "InvalidRequest",
            LmsError::DuplicateEmail(_) => "DuplicateEmail",
            LmsError::InvalidCredentials => "InvalidCredentials",
            LmsError::InvalidToken(_) => "InvalidToken",
            LmsError::NotFound(_) => "NotFound",
            LmsError::PermissionDenied(_) => "PermissionDenied",
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
    /// Create a new error response with a generated trace ID
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            trace_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an error response from an LmsError
    pub fn from_error(error: &LmsError) -> Self {
        Self::new(error.error_type().to_string(), error.to_string())
    }
}

/// Implement IntoResponse for LmsError to enable automatic error handling in Axum
impl IntoResponse for LmsError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        tracing::error!(
            error_type = self.error_type(),
            trace_id = %error_response.trace_id,
            status_code = %status_code,
            "Request failed: {}",
            self
        );

        let mut response = (status_code, Json(error_response)).into_response();

        // 401 responses carry a bearer challenge so clients know how to authenticate
        if status_code == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

/// Result type alias for operations that can fail with LmsError
pub type Result<T> = std::result::Result<T, LmsError>;

/// Context extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context to an error using a closure
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let context_str = context.into();
            LmsError::InitializationError(format!("{}: {}", context_str, e))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let context_str = f();
            LmsError::InitializationError(format!("{}: {}", context_str, e))
        })
    }
}
