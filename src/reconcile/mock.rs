//! In-memory data access double with call counters.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::access::{AccessError, AccessResult, MemberDataAccess};
use crate::models::{
    AddMemberRequest, MemberDetails, MemberProfile, OperationResult, ProjectRole,
    UpdateMemberRequest,
};

#[derive(Default)]
pub struct Calls {
    pub list_roles: usize,
    pub get_detail: usize,
    pub list_members: usize,
    pub add: Vec<AddMemberRequest>,
    pub update: Vec<UpdateMemberRequest>,
    pub remove: Vec<(String, String)>,
}

pub struct MockAccess {
    pub roles: AccessResult<Vec<ProjectRole>>,
    pub member: AccessResult<Option<MemberDetails>>,
    pub add_result: AccessResult<MemberDetails>,
    pub update_result: AccessResult<()>,
    pub remove_result: AccessResult<()>,
    pub calls: Mutex<Calls>,
}

pub fn sample_member() -> MemberDetails {
    MemberDetails {
        project_member_id: "pm-1".to_string(),
        user_id: "u-1".to_string(),
        project_role_id: "r1".to_string(),
        role_name: Some("Researcher".to_string()),
        joined_at: "2024-03-01T12:00:00Z".to_string(),
        profile: Some(MemberProfile {
            user_id: "u-1".to_string(),
            first_name: Some("Ana".to_string()),
            last_name: Some("Lee".to_string()),
            public_contact_email: Some("ana@example.com".to_string()),
            ..Default::default()
        }),
    }
}

impl MockAccess {
    pub fn new() -> Self {
        Self {
            roles: Ok(OperationResult::Success(vec![
                ProjectRole {
                    id: "r1".to_string(),
                    role_name: "Researcher".to_string(),
                },
                ProjectRole {
                    id: "r2".to_string(),
                    role_name: "Reviewer".to_string(),
                },
            ])),
            member: Ok(OperationResult::Success(Some(sample_member()))),
            add_result: Ok(OperationResult::Success(sample_member())),
            update_result: Ok(OperationResult::Success(())),
            remove_result: Ok(OperationResult::Success(())),
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn with_member(mut self, member: AccessResult<Option<MemberDetails>>) -> Self {
        self.member = member;
        self
    }

    pub fn with_add_result(mut self, result: AccessResult<MemberDetails>) -> Self {
        self.add_result = result;
        self
    }

    pub fn with_update_result(mut self, result: AccessResult<()>) -> Self {
        self.update_result = result;
        self
    }

    pub fn with_remove_result(mut self, result: AccessResult<()>) -> Self {
        self.remove_result = result;
        self
    }

    pub fn update_calls(&self) -> Vec<UpdateMemberRequest> {
        self.calls.lock().unwrap().update.clone()
    }

    pub fn write_calls(&self) -> usize {
        let calls = self.calls.lock().unwrap();
        calls.add.len() + calls.update.len() + calls.remove.len()
    }
}

pub fn transport_error<T>() -> AccessResult<T> {
    Err(AccessError::Transport("connection refused".to_string()))
}

#[async_trait]
impl MemberDataAccess for MockAccess {
    async fn list_assignable_roles(&self, _project_id: &str) -> AccessResult<Vec<ProjectRole>> {
        self.calls.lock().unwrap().list_roles += 1;
        self.roles.clone()
    }

    async fn get_member_detail(
        &self,
        _member_id: &str,
        _project_id: &str,
    ) -> AccessResult<Option<MemberDetails>> {
        self.calls.lock().unwrap().get_detail += 1;
        self.member.clone()
    }

    async fn list_members(&self, _project_id: &str) -> AccessResult<Vec<MemberDetails>> {
        self.calls.lock().unwrap().list_members += 1;
        Ok(OperationResult::Success(vec![sample_member()]))
    }

    async fn add_member(&self, request: &AddMemberRequest) -> AccessResult<MemberDetails> {
        self.calls.lock().unwrap().add.push(request.clone());
        self.add_result.clone()
    }

    async fn update_member(&self, request: &UpdateMemberRequest) -> AccessResult<()> {
        self.calls.lock().unwrap().update.push(request.clone());
        self.update_result.clone()
    }

    async fn remove_member(&self, project_id: &str, member_id: &str) -> AccessResult<()> {
        self.calls
            .lock()
            .unwrap()
            .remove
            .push((project_id.to_string(), member_id.to_string()));
        self.remove_result.clone()
    }
}
