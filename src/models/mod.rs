//! Data models for the member management backend.
//!
//! These models match the frontend TypeScript interfaces for seamless interoperability.

mod form;
mod member;
mod patch;
mod result;

pub use form::*;
pub use member::*;
pub use patch::*;
pub use result::*;
