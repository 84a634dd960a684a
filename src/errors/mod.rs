//! Error handling module for the members backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
///
/// `USER_NOT_FOUND`, `ALREADY_MEMBER`, `FORBIDDEN` and `INVALID_ROLE` are
/// also reported by the data access layer.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const ALREADY_MEMBER: &str = "ALREADY_MEMBER";
    pub const INVALID_ROLE: &str = "INVALID_ROLE";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const BACKEND_ERROR: &str = "BACKEND_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Authentication required
    Unauthorized(String),
    /// Authenticated but not allowed
    Forbidden(String),
    /// Resource not found
    NotFound(String),
    /// Validation error, optionally with per-field details
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },
    /// Duplicate or conflicting state
    Conflict(String),
    /// The data backend could not be reached
    Network(String),
    /// The data backend refused the operation
    Backend(String),
    /// Database error
    Database(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Network(_) => StatusCode::BAD_GATEWAY,
            AppError::Backend(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::Forbidden(_) => codes::FORBIDDEN,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation { .. } => codes::VALIDATION_ERROR,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::Network(_) => codes::NETWORK_ERROR,
            AppError::Backend(_) => codes::BACKEND_ERROR,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation { message, .. } => message.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Network(msg) => msg.clone(),
            AppError::Backend(msg) => msg.clone(),
            AppError::Database(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Validation { details, .. } => details.clone(),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: &AppError, error_code: Option<&str>) -> Self {
        Self {
            success: false,
            error: error.message(),
            error_code: error_code.unwrap_or(error.error_code()).to_string(),
            details: error.details(),
        }
    }
}

/// Wrapper type for errors that keep the backend's own error code.
#[derive(Debug)]
pub struct AppErrorWithCode {
    pub error: AppError,
    pub error_code: Option<String>,
}

impl From<AppError> for AppErrorWithCode {
    fn from(error: AppError) -> Self {
        Self {
            error,
            error_code: None,
        }
    }
}

impl IntoResponse for AppErrorWithCode {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = ErrorResponse::new(&self.error, self.error_code.as_deref());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_keeps_backend_code() {
        let error = AppError::NotFound("No user account was found".to_string());
        let body = ErrorResponse::new(&error, Some(codes::USER_NOT_FOUND));

        assert!(!body.success);
        assert_eq!(body.error_code, "USER_NOT_FOUND");
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_response_defaults_to_variant_code() {
        let error = AppError::Validation {
            message: "Invalid form".to_string(),
            details: Some(serde_json::json!([{ "field": "email" }])),
        };
        let body = ErrorResponse::new(&error, None);

        assert_eq!(body.error_code, "VALIDATION_ERROR");
        assert!(body.details.is_some());
    }
}
