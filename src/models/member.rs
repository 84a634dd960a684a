//! Project member model matching the frontend ProjectMemberDetails interface.

use serde::{Deserialize, Serialize};

use super::ProfileField;

/// A role that can be assigned to members of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRole {
    pub id: String,
    pub role_name: String,
}

/// Descriptive attributes attached to a member's user account.
///
/// Every attribute is independently nullable: a missing value is not the
/// same thing as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    /// Read-only once set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_notes: Option<String>,
}

impl MemberProfile {
    /// Current value of an editable field, `None` when unset.
    pub fn value_of(&self, field: ProfileField) -> Option<&str> {
        let value = match field {
            ProfileField::DisplayName => &self.public_display_name,
            ProfileField::FirstName => &self.first_name,
            ProfileField::LastName => &self.last_name,
            ProfileField::Institution => &self.primary_institution,
            ProfileField::Phone => &self.contact_phone,
            ProfileField::Language => &self.preferred_language,
            ProfileField::Pronouns => &self.pronouns,
            ProfileField::Notes => &self.general_notes,
        };
        value.as_deref()
    }
}

/// Snapshot of one member: membership, role and profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetails {
    pub project_member_id: String,
    pub user_id: String,
    pub project_role_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    pub joined_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<MemberProfile>,
}

impl MemberDetails {
    /// Name to show for the member: the public display name, otherwise
    /// first and last name joined. `None` when neither is recorded.
    pub fn display_name(&self) -> Option<String> {
        let profile = self.profile.as_ref()?;
        if let Some(name) = profile.public_display_name.as_deref().filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }

        let full = format!(
            "{} {}",
            profile.first_name.as_deref().unwrap_or(""),
            profile.last_name.as_deref().unwrap_or("")
        );
        let full = full.trim();
        (!full.is_empty()).then(|| full.to_string())
    }

    /// Contact email recorded on the profile, if any.
    pub fn contact_email(&self) -> Option<&str> {
        self.profile.as_ref()?.public_contact_email.as_deref()
    }
}

/// Permission flags the caller holds in the current project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPermissions {
    pub can_manage_master_data: bool,
}

/// The project a workflow runs against, passed explicitly to every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub project_id: String,
    pub permissions: ProjectPermissions,
}

impl ProjectContext {
    pub fn new(project_id: impl Into<String>, permissions: ProjectPermissions) -> Self {
        Self {
            project_id: project_id.into(),
            permissions,
        }
    }

    pub fn can_manage_members(&self) -> bool {
        self.permissions.can_manage_master_data
    }
}
