//! Uniform result shape returned by every data access operation.

/// Failure reported by the backend: a message plus an optional error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub error: String,
    pub error_code: Option<String>,
}

/// `{success: true, data}` or `{success: false, error, errorCode?}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult<T> {
    Success(T),
    Failure(BackendFailure),
}

impl<T> OperationResult<T> {
    pub fn failure(code: &str, error: impl Into<String>) -> Self {
        OperationResult::Failure(BackendFailure {
            error: error.into(),
            error_code: Some(code.to_string()),
        })
    }

    #[cfg(test)]
    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success(_))
    }
}
