//! Profile/role data access contract.
//!
//! The backend is an opaque remote service. Failures it reports on purpose
//! (missing user, duplicate membership, row-level security denials) come
//! back as [`OperationResult::Failure`]; anything that went wrong while
//! talking to it is an [`AccessError`].

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    AddMemberRequest, MemberDetails, OperationResult, ProjectRole, UpdateMemberRequest,
};

/// Failure raised while performing a call, as opposed to one the backend reported.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    /// The backend could not be reached or the connection dropped
    #[error("transport failure: {0}")]
    Transport(String),

    /// Anything else that went wrong during the call
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl From<sqlx::Error> for AccessError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => AccessError::Transport(err.to_string()),
            other => AccessError::Unexpected(other.to_string()),
        }
    }
}

pub type AccessResult<T> = Result<OperationResult<T>, AccessError>;

/// Operations the member workflows need from the backend.
#[async_trait]
pub trait MemberDataAccess: Send + Sync {
    /// Roles assignable within the project, ordered by name.
    async fn list_assignable_roles(&self, project_id: &str) -> AccessResult<Vec<ProjectRole>>;

    /// Member, role and profile snapshot. `None` when no such member exists in the project.
    async fn get_member_detail(
        &self,
        member_id: &str,
        project_id: &str,
    ) -> AccessResult<Option<MemberDetails>>;

    /// Every member of the project with profile and role name.
    async fn list_members(&self, project_id: &str) -> AccessResult<Vec<MemberDetails>>;

    /// Add an existing user, found by email, to the project.
    async fn add_member(&self, request: &AddMemberRequest) -> AccessResult<MemberDetails>;

    /// Apply a profile patch and/or role change to one member.
    async fn update_member(&self, request: &UpdateMemberRequest) -> AccessResult<()>;

    /// Hard-delete a membership.
    async fn remove_member(&self, project_id: &str, member_id: &str) -> AccessResult<()>;
}
