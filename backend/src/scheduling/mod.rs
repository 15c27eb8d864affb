//! Shift scheduling rules: time parsing, double-booking detection, cost
//! derivation, the status state machine and the authorization gate.
//!
//! Nothing in here touches the database; `shift_repo` drives these rules
//! inside a transaction.

pub mod conflict;
pub mod cost;
pub mod edit;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod timestamp;

pub use error::ShiftError;
