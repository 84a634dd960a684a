//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.

mod members;
mod roles;

pub use members::*;
pub use roles::*;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::Caller;
use crate::db::MemberSession;
use crate::errors::AppErrorWithCode;
use crate::models::ProjectContext;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithCode>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: impl Into<AppErrorWithCode>) -> ApiResult<T> {
    Err(err.into())
}

/// Data access session and project context for the caller of a request.
async fn caller_scope(
    state: &AppState,
    caller: &Caller,
    project_id: &str,
) -> Result<(Arc<MemberSession>, ProjectContext), AppErrorWithCode> {
    let ctx = state.repo.project_context(project_id, &caller.user_id).await?;
    let session = Arc::new(state.repo.session(caller.user_id.clone()));
    Ok((session, ctx))
}
