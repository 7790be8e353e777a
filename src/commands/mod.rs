//! Command wrappers: argument parsing, precondition checks and result
//! rendering around the core engines.

pub mod apply;
pub mod assign;
pub mod status;
pub mod sync;
pub mod unapply;
pub mod unassign;
