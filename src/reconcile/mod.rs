//! Member workflows.
//!
//! The editor runs the load → diff → update → report cycle for one member;
//! `flows` holds the one-shot list/view/add/remove operations. Both report
//! failures as values and never surface a data access error directly.

mod diff;
mod editor;
mod flows;
mod messages;
mod outcome;

#[cfg(test)]
pub(crate) mod mock;

pub use editor::*;
pub use flows::*;
pub use outcome::*;
