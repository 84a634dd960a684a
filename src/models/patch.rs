//! Partial updates sent to the backend.

use serde::{Deserialize, Serialize};

/// Profile attributes that can be edited through a member form.
///
/// The contact email is deliberately absent: it is read-only once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProfileField {
    DisplayName,
    FirstName,
    LastName,
    Institution,
    Phone,
    Language,
    Pronouns,
    Notes,
}

impl ProfileField {
    pub const EDITABLE: [ProfileField; 8] = [
        ProfileField::DisplayName,
        ProfileField::FirstName,
        ProfileField::LastName,
        ProfileField::Institution,
        ProfileField::Phone,
        ProfileField::Language,
        ProfileField::Pronouns,
        ProfileField::Notes,
    ];

    /// Column name in the `user_profiles` table.
    pub fn column(self) -> &'static str {
        match self {
            ProfileField::DisplayName => "public_display_name",
            ProfileField::FirstName => "first_name",
            ProfileField::LastName => "last_name",
            ProfileField::Institution => "primary_institution",
            ProfileField::Phone => "contact_phone",
            ProfileField::Language => "preferred_language",
            ProfileField::Pronouns => "pronouns",
            ProfileField::Notes => "general_notes",
        }
    }
}

/// Set of profile fields to write. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_notes: Option<String>,
}

impl ProfilePatch {
    fn slot(&self, field: ProfileField) -> &Option<String> {
        match field {
            ProfileField::DisplayName => &self.public_display_name,
            ProfileField::FirstName => &self.first_name,
            ProfileField::LastName => &self.last_name,
            ProfileField::Institution => &self.primary_institution,
            ProfileField::Phone => &self.contact_phone,
            ProfileField::Language => &self.preferred_language,
            ProfileField::Pronouns => &self.pronouns,
            ProfileField::Notes => &self.general_notes,
        }
    }

    fn slot_mut(&mut self, field: ProfileField) -> &mut Option<String> {
        match field {
            ProfileField::DisplayName => &mut self.public_display_name,
            ProfileField::FirstName => &mut self.first_name,
            ProfileField::LastName => &mut self.last_name,
            ProfileField::Institution => &mut self.primary_institution,
            ProfileField::Phone => &mut self.contact_phone,
            ProfileField::Language => &mut self.preferred_language,
            ProfileField::Pronouns => &mut self.pronouns,
            ProfileField::Notes => &mut self.general_notes,
        }
    }

    pub fn get(&self, field: ProfileField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: ProfileField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// Fields present in the patch, in column order.
    pub fn entries(&self) -> Vec<(ProfileField, &str)> {
        ProfileField::EDITABLE
            .iter()
            .filter_map(|&field| self.get(field).map(|value| (field, value)))
            .collect()
    }

    pub fn len(&self) -> usize {
        ProfileField::EDITABLE
            .iter()
            .filter(|&&field| self.slot(field).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reassignment of a member to another role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChange {
    #[serde(rename = "nuevoRolId")]
    pub new_role_id: String,
}

/// Payload of the "add member by email" operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub project_id: String,
    pub user_email: String,
    pub role_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_profile: Option<ProfilePatch>,
}

/// Combined member update: either partition may be absent, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    pub project_id: String,
    pub project_member_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_updates: Option<ProfilePatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_updates: Option<RoleChange>,
}
