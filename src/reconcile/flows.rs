//! One-shot member flows: list, view, add, remove.

use super::messages::MEMBER_NOT_FOUND;
use super::outcome::{Failure, FailureKind, Removed};
use crate::access::MemberDataAccess;
use crate::models::{AddMemberRequest, MemberDetails, MemberFormValues, OperationResult, ProjectContext};

fn require_project(ctx: &ProjectContext) -> Result<(), Failure> {
    if ctx.project_id.trim().is_empty() {
        return Err(Failure::invalid_input("No project selected."));
    }
    Ok(())
}

fn require_member(member_id: &str) -> Result<(), Failure> {
    if member_id.trim().is_empty() {
        return Err(Failure::invalid_input("Member id was not specified."));
    }
    Ok(())
}

/// All members of the current project.
pub async fn list_members<A: MemberDataAccess + ?Sized>(
    access: &A,
    ctx: &ProjectContext,
) -> Result<Vec<MemberDetails>, Failure> {
    require_project(ctx)?;

    match access.list_members(&ctx.project_id).await {
        Ok(OperationResult::Success(members)) => Ok(members),
        Ok(OperationResult::Failure(f)) => Err(Failure::from_backend(&f, None)),
        Err(err) => Err(Failure::from_access(err)),
    }
}

/// One member of the current project.
pub async fn view_member<A: MemberDataAccess + ?Sized>(
    access: &A,
    ctx: &ProjectContext,
    member_id: &str,
) -> Result<MemberDetails, Failure> {
    require_project(ctx)?;
    require_member(member_id)?;

    match access.get_member_detail(member_id, &ctx.project_id).await {
        Ok(OperationResult::Success(Some(member))) => Ok(member),
        Ok(OperationResult::Success(None)) => {
            Err(Failure::new(FailureKind::NotFound, MEMBER_NOT_FOUND))
        }
        Ok(OperationResult::Failure(f)) => Err(Failure::from_backend(&f, None)),
        Err(err) => Err(Failure::from_access(err)),
    }
}

/// Add an existing user to the project by email.
///
/// `form` must already have passed `validation::validate_new_member`.
pub async fn add_member<A: MemberDataAccess + ?Sized>(
    access: &A,
    ctx: &ProjectContext,
    form: &MemberFormValues,
) -> Result<MemberDetails, Failure> {
    require_project(ctx)?;

    let request = AddMemberRequest {
        project_id: ctx.project_id.clone(),
        user_email: form.email.clone(),
        role_id: form.role_id.clone(),
        initial_profile: form.initial_profile(),
    };

    match access.add_member(&request).await {
        Ok(OperationResult::Success(member)) => {
            tracing::info!(
                "Member {} added to project {}",
                member.project_member_id,
                ctx.project_id
            );
            Ok(member)
        }
        Ok(OperationResult::Failure(f)) => {
            let failure = Failure::from_backend(&f, Some(&form.email));
            tracing::warn!("Adding {} failed: {}", form.email, f.error);
            Err(failure)
        }
        Err(err) => Err(Failure::from_access(err)),
    }
}

/// Hard-delete a membership. There is no undo.
pub async fn remove_member<A: MemberDataAccess + ?Sized>(
    access: &A,
    ctx: &ProjectContext,
    member_id: &str,
) -> Result<Removed, Failure> {
    require_project(ctx)?;
    require_member(member_id)?;

    match access.remove_member(&ctx.project_id, member_id).await {
        Ok(OperationResult::Success(())) => Ok(Removed {
            member_id: member_id.to_string(),
        }),
        Ok(OperationResult::Failure(f)) => Err(Failure::from_backend(&f, None)),
        Err(err) => Err(Failure::from_access(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectPermissions;
    use crate::reconcile::mock::{transport_error, MockAccess};

    fn ctx() -> ProjectContext {
        ProjectContext::new("p1", ProjectPermissions::default())
    }

    fn new_member_form(email: &str) -> MemberFormValues {
        MemberFormValues {
            email: email.to_string(),
            role_id: "r1".to_string(),
            first_name: Some("Nico".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_member_sends_initial_profile() {
        let access = MockAccess::new();
        let member = add_member(&access, &ctx(), &new_member_form("nico@example.com"))
            .await
            .unwrap();
        assert_eq!(member.project_member_id, "pm-1");

        let calls = access.calls.lock().unwrap();
        assert_eq!(calls.add.len(), 1);
        let request = &calls.add[0];
        assert_eq!(request.user_email, "nico@example.com");
        assert_eq!(request.role_id, "r1");
        let initial = request.initial_profile.as_ref().unwrap();
        assert_eq!(initial.len(), 1);
        assert_eq!(initial.first_name.as_deref(), Some("Nico"));
    }

    #[tokio::test]
    async fn test_add_unknown_user_mentions_email() {
        let access = MockAccess::new().with_add_result(Ok(OperationResult::failure(
            "USER_NOT_FOUND",
            "no such user",
        )));

        let failure = add_member(&access, &ctx(), &new_member_form("ghost@example.com"))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::NotFound);
        assert_eq!(failure.code.as_deref(), Some("USER_NOT_FOUND"));
        assert!(failure.message.contains("ghost@example.com"));
    }

    #[tokio::test]
    async fn test_add_duplicate_and_forbidden_copy() {
        let duplicate = MockAccess::new().with_add_result(Ok(OperationResult::failure(
            "ALREADY_MEMBER",
            "duplicate key value",
        )));
        let failure = add_member(&duplicate, &ctx(), &new_member_form("ana@example.com"))
            .await
            .unwrap_err();
        assert_eq!(failure.message, "The user is already a member of this project.");
        assert_eq!(failure.kind, FailureKind::Conflict);

        let forbidden = MockAccess::new()
            .with_add_result(Ok(OperationResult::failure("FORBIDDEN", "rls")));
        let failure = add_member(&forbidden, &ctx(), &new_member_form("ana@example.com"))
            .await
            .unwrap_err();
        assert_eq!(
            failure.message,
            "You do not have permission to perform this action."
        );
    }

    #[tokio::test]
    async fn test_add_generic_failure_passes_raw_message() {
        let access = MockAccess::new()
            .with_add_result(Ok(OperationResult::failure("INVALID_ROLE", "Role r9 is unknown")));
        let failure = add_member(&access, &ctx(), &new_member_form("ana@example.com"))
            .await
            .unwrap_err();
        assert_eq!(failure.message, "Role r9 is unknown");
    }

    #[tokio::test]
    async fn test_remove_member_issues_one_delete() {
        let access = MockAccess::new();
        let removed = remove_member(&access, &ctx(), "pm-1").await.unwrap();
        assert_eq!(
            removed,
            Removed {
                member_id: "pm-1".to_string()
            }
        );

        let calls = access.calls.lock().unwrap();
        assert_eq!(calls.remove, vec![("p1".to_string(), "pm-1".to_string())]);
    }

    #[tokio::test]
    async fn test_remove_requires_ids() {
        let access = MockAccess::new();
        assert!(remove_member(&access, &ctx(), "").await.is_err());
        assert!(remove_member(&access, &ProjectContext::default(), "pm-1")
            .await
            .is_err());
        assert_eq!(access.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_remove_transport_failure() {
        let access = MockAccess::new().with_remove_result(transport_error());
        let failure = remove_member(&access, &ctx(), "pm-1").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Network);
    }

    #[tokio::test]
    async fn test_view_missing_member() {
        let access = MockAccess::new().with_member(Ok(OperationResult::Success(None)));
        let failure = view_member(&access, &ctx(), "pm-9").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_members() {
        let access = MockAccess::new();
        let members = list_members(&access, &ctx()).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(access.calls.lock().unwrap().list_members, 1);
    }
}
