//! Role API endpoints.

use axum::extract::{Path, State};

use super::{caller_scope, error, success, ApiResult};
use crate::access::MemberDataAccess;
use crate::auth::Caller;
use crate::models::{OperationResult, ProjectRole};
use crate::reconcile::Failure;
use crate::AppState;

/// GET /api/projects/:project_id/roles - Roles assignable in the project.
pub async fn list_roles(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<String>,
) -> ApiResult<Vec<ProjectRole>> {
    let (session, _ctx) = caller_scope(&state, &caller, &project_id).await?;

    match session.list_assignable_roles(&project_id).await {
        Ok(OperationResult::Success(roles)) => success(roles),
        Ok(OperationResult::Failure(f)) => error(Failure::from_backend(&f, None)),
        Err(e) => error(Failure::from_access(e)),
    }
}
