//! Member reconciliation workflow: load, diff, update, report.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::diff::diff_member;
use super::messages::{MEMBER_NOT_FOUND, NO_CHANGES};
use super::outcome::{EditorEvent, Failure, FailureKind, SubmitOutcome};
use crate::access::MemberDataAccess;
use crate::models::{MemberDetails, MemberFormValues, OperationResult, ProjectContext, ProjectRole};

const EVENT_CAPACITY: usize = 16;

/// Where an editor is in its load/submit cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    Loading,
    /// Role options and the member snapshot are available via [`MemberEditor::loaded`]
    Ready,
    Submitting,
    Succeeded,
    Failed(Failure),
    NoOp,
}

/// Data captured by a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedMember {
    pub roles: Vec<ProjectRole>,
    pub member: MemberDetails,
}

/// Edits one member of one project.
///
/// `submit` borrows the editor mutably, so a single editor never runs two
/// submits at once. Separate editors for the same member are not
/// coordinated; callers keep the submit trigger disabled while busy.
pub struct MemberEditor<A: ?Sized> {
    access: Arc<A>,
    ctx: ProjectContext,
    member_id: String,
    state: EditorState,
    loaded: Option<LoadedMember>,
    events: broadcast::Sender<EditorEvent>,
}

impl<A: MemberDataAccess + ?Sized> MemberEditor<A> {
    pub fn new(access: Arc<A>, ctx: ProjectContext, member_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            access,
            ctx,
            member_id: member_id.into(),
            state: EditorState::Idle,
            loaded: None,
            events,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    #[cfg(test)]
    pub fn loaded(&self) -> Option<&LoadedMember> {
        self.loaded.as_ref()
    }

    /// Receive `Succeeded`, `Failed` and `NoOp` events. Every outcome is
    /// also returned by the call that produced it.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: EditorEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn fail(&mut self, failure: Failure) -> Failure {
        tracing::warn!(
            "Member {} workflow failed ({:?}): {}",
            self.member_id,
            failure.kind,
            failure.detail.as_deref().unwrap_or(&failure.message)
        );
        self.emit(EditorEvent::Failed {
            message: failure.message.clone(),
        });
        self.state = EditorState::Failed(failure.clone());
        failure
    }

    /// Fetch the assignable roles and the member snapshot.
    pub async fn load(&mut self) -> Result<&LoadedMember, Failure> {
        self.loaded = None;

        if self.ctx.project_id.trim().is_empty() {
            return Err(self.fail(Failure::invalid_input(
                "No active project selected. Please select one.",
            )));
        }
        if self.member_id.trim().is_empty() {
            return Err(self.fail(Failure::invalid_input("Member id was not specified.")));
        }

        self.state = EditorState::Loading;
        tracing::debug!(
            "Loading member {} in project {}",
            self.member_id,
            self.ctx.project_id
        );

        let (roles, member) = tokio::join!(
            self.access.list_assignable_roles(&self.ctx.project_id),
            self.access
                .get_member_detail(&self.member_id, &self.ctx.project_id),
        );

        let member = match member {
            Ok(OperationResult::Success(Some(member))) => member,
            Ok(OperationResult::Success(None)) => {
                return Err(self.fail(Failure::new(FailureKind::NotFound, MEMBER_NOT_FOUND)))
            }
            Ok(OperationResult::Failure(f)) => return Err(self.fail(Failure::from_backend(&f, None))),
            Err(err) => return Err(self.fail(Failure::from_access(err))),
        };

        let roles = match roles {
            Ok(OperationResult::Success(roles)) => roles,
            Ok(OperationResult::Failure(f)) => return Err(self.fail(Failure::from_backend(&f, None))),
            Err(err) => return Err(self.fail(Failure::from_access(err))),
        };

        tracing::debug!(
            "Loaded member {} with {} role options",
            self.member_id,
            roles.len()
        );
        self.state = EditorState::Ready;
        Ok(self.loaded.insert(LoadedMember { roles, member }))
    }

    /// Diff the form against the loaded snapshot and apply the changes with
    /// a single update call.
    ///
    /// `form` must already have passed `validation::validate_member_edit`.
    pub async fn submit(&mut self, form: &MemberFormValues) -> SubmitOutcome {
        let accepts = matches!(
            self.state,
            EditorState::Ready | EditorState::NoOp | EditorState::Failed(_)
        );
        let Some(loaded) = self.loaded.as_ref().filter(|_| accepts) else {
            return SubmitOutcome::Failed(
                self.fail(Failure::invalid_input("Member data has not been loaded.")),
            );
        };

        let diff = diff_member(&loaded.member, form);
        let email = loaded.member.contact_email().map(str::to_string);

        if diff.is_empty() {
            tracing::info!("No changes detected for member {}", self.member_id);
            self.state = EditorState::NoOp;
            self.emit(EditorEvent::NoOp {
                message: NO_CHANGES.to_string(),
            });
            return SubmitOutcome::NoOp {
                message: NO_CHANGES.to_string(),
            };
        }

        let request = diff.into_request(&self.ctx.project_id, &self.member_id);
        tracing::info!(
            "Updating member {}: {} profile field(s), role change: {}",
            self.member_id,
            request.profile_updates.as_ref().map_or(0, |p| p.len()),
            request.member_updates.is_some()
        );

        self.state = EditorState::Submitting;
        match self.access.update_member(&request).await {
            Ok(OperationResult::Success(())) => {
                // The snapshot is stale now; callers reload before editing again.
                self.loaded = None;
                self.state = EditorState::Succeeded;
                self.emit(EditorEvent::Succeeded {
                    member_id: self.member_id.clone(),
                });
                SubmitOutcome::Succeeded
            }
            Ok(OperationResult::Failure(f)) => {
                SubmitOutcome::Failed(self.fail(Failure::from_backend(&f, email.as_deref())))
            }
            Err(err) => SubmitOutcome::Failed(self.fail(Failure::from_access(err))),
        }
    }
}
