//! Member API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{caller_scope, error, success, ApiResult};
use crate::auth::Caller;
use crate::models::{MemberDetails, MemberFormValues, PreferredLanguage};
use crate::reconcile::{self, EditorEvent, MemberEditor, Removed, SubmitOutcome};
use crate::validation::{into_app_error, validate_member_edit, validate_new_member};
use crate::AppState;

const UNNAMED: &str = "No name recorded";
const UPDATED: &str = "Member updated successfully.";

/// A member as shown in listings and detail views.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    #[serde(flatten)]
    pub member: MemberDetails,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_label: Option<String>,
}

impl From<MemberDetails> for MemberView {
    fn from(member: MemberDetails) -> Self {
        let name = member
            .display_name()
            .unwrap_or_else(|| UNNAMED.to_string());
        let language_label = member
            .profile
            .as_ref()
            .and_then(|p| p.preferred_language.as_deref())
            .filter(|l| !l.is_empty())
            .map(|l| PreferredLanguage::parse(l).label().to_string());
        Self {
            member,
            name,
            language_label,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberList {
    pub can_manage: bool,
    pub members: Vec<MemberView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub outcome: &'static str,
    pub message: String,
}

/// GET /api/projects/:project_id/members - List members with profiles and roles.
pub async fn list_members(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<String>,
) -> ApiResult<MemberList> {
    let (session, ctx) = caller_scope(&state, &caller, &project_id).await?;

    match reconcile::list_members(session.as_ref(), &ctx).await {
        Ok(members) => success(MemberList {
            can_manage: ctx.can_manage_members(),
            members: members.into_iter().map(MemberView::from).collect(),
        }),
        Err(f) => error(f),
    }
}

/// GET /api/projects/:project_id/members/:member_id - Get a single member.
pub async fn get_member(
    State(state): State<AppState>,
    caller: Caller,
    Path((project_id, member_id)): Path<(String, String)>,
) -> ApiResult<MemberView> {
    let (session, ctx) = caller_scope(&state, &caller, &project_id).await?;

    match reconcile::view_member(session.as_ref(), &ctx, &member_id).await {
        Ok(member) => success(member.into()),
        Err(f) => error(f),
    }
}

/// POST /api/projects/:project_id/members - Add an existing user by email.
pub async fn create_member(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<String>,
    Json(form): Json<MemberFormValues>,
) -> ApiResult<MemberView> {
    if let Err(errors) = validate_new_member(&form) {
        return error(into_app_error(errors));
    }

    let (session, ctx) = caller_scope(&state, &caller, &project_id).await?;

    match reconcile::add_member(session.as_ref(), &ctx, &form).await {
        Ok(member) => success(member.into()),
        Err(f) => error(f),
    }
}

/// PUT /api/projects/:project_id/members/:member_id - Reconcile a member with the submitted form.
pub async fn update_member(
    State(state): State<AppState>,
    caller: Caller,
    Path((project_id, member_id)): Path<(String, String)>,
    Json(form): Json<MemberFormValues>,
) -> ApiResult<UpdateResult> {
    if let Err(errors) = validate_member_edit(&form) {
        return error(into_app_error(errors));
    }

    let (session, ctx) = caller_scope(&state, &caller, &project_id).await?;
    let mut editor = MemberEditor::new(session, ctx, member_id);
    let mut events = editor.subscribe();

    let loaded = editor.load().await.map(|_| ());
    let outcome = match loaded {
        Ok(()) => editor.submit(&form).await,
        Err(f) => SubmitOutcome::Failed(f),
    };

    while let Ok(event) = events.try_recv() {
        log_editor_event(&caller, &project_id, &event);
    }
    tracing::debug!("Member editor finished in state {:?}", editor.state());

    match outcome {
        SubmitOutcome::Succeeded => success(UpdateResult {
            outcome: "updated",
            message: UPDATED.to_string(),
        }),
        SubmitOutcome::NoOp { message } => success(UpdateResult {
            outcome: "unchanged",
            message,
        }),
        SubmitOutcome::Failed(f) => error(f),
    }
}

fn log_editor_event(caller: &Caller, project_id: &str, event: &EditorEvent) {
    match event {
        EditorEvent::Succeeded { member_id } => tracing::info!(
            "User {} updated member {} in project {}",
            caller.user_id,
            member_id,
            project_id
        ),
        EditorEvent::NoOp { message } => {
            tracing::debug!("Update by {} in project {}: {}", caller.user_id, project_id, message)
        }
        EditorEvent::Failed { message } => tracing::warn!(
            "Update by {} in project {} failed: {}",
            caller.user_id,
            project_id,
            message
        ),
    }
}

/// DELETE /api/projects/:project_id/members/:member_id - Remove a member.
pub async fn delete_member(
    State(state): State<AppState>,
    caller: Caller,
    Path((project_id, member_id)): Path<(String, String)>,
) -> ApiResult<Removed> {
    let (session, ctx) = caller_scope(&state, &caller, &project_id).await?;

    match reconcile::remove_member(session.as_ref(), &ctx, &member_id).await {
        Ok(removed) => success(removed),
        Err(f) => error(f),
    }
}
