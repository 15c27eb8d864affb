use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use crate::models::shift::ShiftStatus;

/// Rejections raised by the scheduling core.
///
/// All of these are deterministic for a given input, so callers should change
/// the request rather than retry it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ShiftError {
    #[error("Invalid {field} format: {value:?}. Use ISO format or local datetime.")]
    InvalidTimeFormat { field: &'static str, value: String },

    #[error("End time must be after start time")]
    InvalidTimeRange {
        start: OffsetDateTime,
        end: OffsetDateTime,
    },

    #[error("Participant not found or inactive")]
    InvalidParticipant(Uuid),

    #[error("Staff member not found or inactive")]
    InvalidStaff(Uuid),

    #[error("Staff member already has a shift scheduled during this time")]
    ScheduleConflict {
        staff_id: Uuid,
        conflicting_shift_id: Uuid,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: ShiftStatus, to: ShiftStatus },

    #[error("Cannot start shift more than 30 minutes early. Shift starts in {minutes_early} minutes.")]
    TooEarlyToStart { minutes_early: i64 },

    #[error("{0}")]
    InsufficientPermissions(&'static str),

    #[error("{0}")]
    InvalidOperation(&'static str),

    #[error("Shift not found")]
    NotFound(Uuid),
}

impl ShiftError {
    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            ShiftError::InvalidTimeFormat { .. } => "INVALID_TIME_FORMAT",
            ShiftError::InvalidTimeRange { .. } => "INVALID_TIME_RANGE",
            ShiftError::InvalidParticipant(_) => "INVALID_PARTICIPANT",
            ShiftError::InvalidStaff(_) => "INVALID_STAFF",
            ShiftError::ScheduleConflict { .. } => "SCHEDULE_CONFLICT",
            ShiftError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ShiftError::TooEarlyToStart { .. } => "TOO_EARLY_TO_START",
            ShiftError::InsufficientPermissions(_) => "INSUFFICIENT_PERMISSIONS",
            ShiftError::InvalidOperation(_) => "INVALID_OPERATION",
            ShiftError::NotFound(_) => "SHIFT_NOT_FOUND",
        }
    }

    /// Field values a client needs to render a specific message.
    pub fn details(&self) -> Value {
        match self {
            ShiftError::InvalidTimeFormat { field, value } => {
                json!({ "field": field, "value": value })
            }
            ShiftError::InvalidTimeRange { start, end } => json!({
                "start_time": rfc3339(start),
                "end_time": rfc3339(end),
            }),
            ShiftError::InvalidParticipant(id) => json!({ "participant_id": id }),
            ShiftError::InvalidStaff(id) => json!({ "staff_id": id }),
            ShiftError::ScheduleConflict {
                staff_id,
                conflicting_shift_id,
            } => json!({
                "staff_id": staff_id,
                "conflicting_shift_id": conflicting_shift_id,
            }),
            ShiftError::InvalidTransition { from, to } => json!({ "from": from, "to": to }),
            ShiftError::TooEarlyToStart { minutes_early } => {
                json!({ "minutes_early": minutes_early })
            }
            ShiftError::NotFound(id) => json!({ "shift_id": id }),
            ShiftError::InsufficientPermissions(_) | ShiftError::InvalidOperation(_) => json!({}),
        }
    }
}

/// Same wire format the shift rows use.
fn rfc3339(t: &OffsetDateTime) -> Value {
    t.format(&Rfc3339).map_or(Value::Null, Value::String)
}
