//! Shape validation for member forms.
//!
//! Runs before any workflow: required email (new members only) with a valid
//! format, a selected role, and bounded notes. Optional text fields and the
//! preferred language accept any value.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::MemberFormValues;

pub const NOTES_MAX_CHARS: usize = 500;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// A single form problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn check_common(form: &MemberFormValues, errors: &mut Vec<FieldError>) {
    if form.role_id.is_empty() {
        errors.push(FieldError {
            field: "roleId",
            message: "A role must be selected",
        });
    }

    let notes_len = form.notes.as_deref().map_or(0, |n| n.chars().count());
    if notes_len > NOTES_MAX_CHARS {
        errors.push(FieldError {
            field: "notes",
            message: "Notes must be at most 500 characters",
        });
    }
}

/// Validate the form used to add a member.
pub fn validate_new_member(form: &MemberFormValues) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if form.email.is_empty() {
        errors.push(FieldError {
            field: "email",
            message: "Email is required",
        });
    } else if !is_valid_email(&form.email) {
        errors.push(FieldError {
            field: "email",
            message: "Invalid email",
        });
    }
    check_common(form, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the form used to edit a member. The email is read-only there
/// and is not checked.
pub fn validate_member_edit(form: &MemberFormValues) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    check_common(form, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Convert field errors into the API validation error.
pub fn into_app_error(errors: Vec<FieldError>) -> AppError {
    let message = errors
        .first()
        .map(|e| e.message.to_string())
        .unwrap_or_else(|| "Invalid form".to_string());
    AppError::Validation {
        message,
        details: serde_json::to_value(&errors).ok(),
    }
}
