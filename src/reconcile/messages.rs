//! User-facing copy for backend error codes.

use crate::errors::codes;

pub const NO_CHANGES: &str = "No changes detected.";
pub const MEMBER_NOT_FOUND: &str = "The requested member was not found.";
pub const ALREADY_MEMBER: &str = "The user is already a member of this project.";
pub const FORBIDDEN: &str = "You do not have permission to perform this action.";
pub const UNKNOWN_ERROR: &str = "Unknown error.";

/// Message for a backend failure.
///
/// `USER_NOT_FOUND`, `ALREADY_MEMBER` and `FORBIDDEN` get fixed sentences;
/// any other code passes the backend message through unchanged.
pub fn user_facing_message(code: Option<&str>, raw: &str, email: Option<&str>) -> String {
    match code {
        Some(codes::USER_NOT_FOUND) => match email {
            Some(email) => format!("No user account was found with the email '{}'.", email),
            None => "No user account was found for this member.".to_string(),
        },
        Some(codes::ALREADY_MEMBER) => ALREADY_MEMBER.to_string(),
        Some(codes::FORBIDDEN) => FORBIDDEN.to_string(),
        _ if raw.is_empty() => UNKNOWN_ERROR.to_string(),
        _ => raw.to_string(),
    }
}
