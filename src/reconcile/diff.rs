//! Diff engine: minimal change set between a loaded member and a submitted form.

use crate::models::{
    MemberDetails, MemberFormValues, ProfileField, ProfilePatch, RoleChange, UpdateMemberRequest,
};

/// Changes a submitted form makes to a member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberDiff {
    pub profile_changes: ProfilePatch,
    pub role_change: Option<RoleChange>,
}

impl MemberDiff {
    /// An empty diff means no write may be issued.
    pub fn is_empty(&self) -> bool {
        self.profile_changes.is_empty() && self.role_change.is_none()
    }

    /// Combined update carrying only the non-empty partitions.
    pub fn into_request(self, project_id: &str, member_id: &str) -> UpdateMemberRequest {
        UpdateMemberRequest {
            project_id: project_id.to_string(),
            project_member_id: member_id.to_string(),
            profile_updates: (!self.profile_changes.is_empty()).then_some(self.profile_changes),
            member_updates: self.role_change,
        }
    }
}

/// Compare `submitted` against `original`.
///
/// Missing values on either side read as the empty string. Comparison is
/// exact: whitespace and case differences count as changes. The contact
/// email is never compared.
pub fn diff_member(original: &MemberDetails, submitted: &MemberFormValues) -> MemberDiff {
    let mut profile_changes = ProfilePatch::default();

    for field in ProfileField::EDITABLE {
        let before = original
            .profile
            .as_ref()
            .and_then(|profile| profile.value_of(field))
            .unwrap_or("");
        let after = submitted.profile_value(field);

        if before != after {
            profile_changes.set(field, after);
        }
    }

    let role_change = (!submitted.role_id.is_empty()
        && submitted.role_id != original.project_role_id)
        .then(|| RoleChange {
            new_role_id: submitted.role_id.clone(),
        });

    MemberDiff {
        profile_changes,
        role_change,
    }
}
