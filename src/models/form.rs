//! Member form values as submitted by the client.

use serde::{Deserialize, Serialize};

use super::{ProfileField, ProfilePatch};

/// Values of the member form.
///
/// Shape checks (email format, role selection, notes length) happen in
/// `crate::validation` before these reach a workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberFormValues {
    #[serde(default, alias = "emailUsuario")]
    pub email: String,
    #[serde(default, alias = "rolId")]
    pub role_id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub pronouns: Option<String>,
}

impl MemberFormValues {
    /// Submitted value for a profile field; missing values read as "".
    pub fn profile_value(&self, field: ProfileField) -> &str {
        let value = match field {
            ProfileField::DisplayName => &self.display_name,
            ProfileField::FirstName => &self.first_name,
            ProfileField::LastName => &self.last_name,
            ProfileField::Institution => &self.institution,
            ProfileField::Phone => &self.phone,
            ProfileField::Language => &self.language,
            ProfileField::Pronouns => &self.pronouns,
            ProfileField::Notes => &self.notes,
        };
        value.as_deref().unwrap_or("")
    }

    /// Profile attributes to seed a new membership with. Blank fields are left out.
    pub fn initial_profile(&self) -> Option<ProfilePatch> {
        let mut patch = ProfilePatch::default();
        for field in ProfileField::EDITABLE {
            let value = self.profile_value(field);
            if !value.is_empty() {
                patch.set(field, value);
            }
        }
        (!patch.is_empty()).then_some(patch)
    }
}

/// Preferred language of a member. Known codes get a label, anything else
/// is kept as free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferredLanguage {
    Spanish,
    English,
    Portuguese,
    Other(String),
}

impl PreferredLanguage {
    pub fn parse(value: &str) -> Self {
        match value {
            "es" => PreferredLanguage::Spanish,
            "en" => PreferredLanguage::English,
            "pt" => PreferredLanguage::Portuguese,
            other => PreferredLanguage::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PreferredLanguage::Spanish => "Spanish",
            PreferredLanguage::English => "English",
            PreferredLanguage::Portuguese => "Portuguese",
            PreferredLanguage::Other(value) => value,
        }
    }
}
