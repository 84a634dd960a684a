//! Failure and event types reported by the member workflows.

use serde::Serialize;

use super::messages::user_facing_message;
use crate::access::AccessError;
use crate::errors::{codes, AppError, AppErrorWithCode};
use crate::models::BackendFailure;

/// Category of a workflow failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Validation,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    Network,
    /// Backend refused the call with a code that has no category of its own
    Rejected,
    Unknown,
}

impl FailureKind {
    fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(codes::USER_NOT_FOUND) | Some(codes::NOT_FOUND) => FailureKind::NotFound,
            Some(codes::ALREADY_MEMBER) | Some(codes::CONFLICT) => FailureKind::Conflict,
            Some(codes::FORBIDDEN) => FailureKind::Forbidden,
            Some(codes::UNAUTHORIZED) => FailureKind::Unauthorized,
            Some(codes::VALIDATION_ERROR) | Some(codes::INVALID_ROLE) => FailureKind::Validation,
            _ => FailureKind::Rejected,
        }
    }
}

/// A failed workflow step with one human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    /// Error code reported by the backend, if any
    pub code: Option<String>,
    /// Raw message kept for diagnostics when `message` was rewritten
    pub detail: Option<String>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            detail: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    /// Failure the backend reported, with known codes upgraded to fixed copy.
    pub fn from_backend(failure: &BackendFailure, email: Option<&str>) -> Self {
        let code = failure.error_code.as_deref();
        Self {
            kind: FailureKind::from_code(code),
            message: user_facing_message(code, &failure.error, email),
            code: failure.error_code.clone(),
            detail: Some(failure.error.clone()),
        }
    }

    /// Failure raised while making the call.
    pub fn from_access(err: AccessError) -> Self {
        match err {
            AccessError::Transport(raw) => Self {
                kind: FailureKind::Network,
                message: "Could not reach the data service. Please try again.".to_string(),
                code: None,
                detail: Some(raw),
            },
            AccessError::Unexpected(raw) => Self {
                kind: FailureKind::Unknown,
                message: format!("Unexpected error: {}", raw),
                code: None,
                detail: Some(raw),
            },
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl From<Failure> for AppErrorWithCode {
    fn from(failure: Failure) -> Self {
        let message = failure.message;
        let error = match failure.kind {
            FailureKind::Validation => AppError::Validation {
                message,
                details: None,
            },
            FailureKind::NotFound => AppError::NotFound(message),
            FailureKind::Unauthorized => AppError::Unauthorized(message),
            FailureKind::Forbidden => AppError::Forbidden(message),
            FailureKind::Conflict => AppError::Conflict(message),
            FailureKind::Network => AppError::Network(message),
            FailureKind::Rejected => AppError::Backend(message),
            FailureKind::Unknown => AppError::Internal(message),
        };
        AppErrorWithCode {
            error,
            error_code: failure.code,
        }
    }
}

/// Events emitted by the member editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    Succeeded { member_id: String },
    Failed { message: String },
    NoOp { message: String },
}

/// Result of a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// One update was applied; the caller should refresh or navigate away
    Succeeded,
    /// Nothing differed from the loaded state; no call was made
    NoOp { message: String },
    Failed(Failure),
}

/// Confirmation of a hard delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Removed {
    pub member_id: String,
}
