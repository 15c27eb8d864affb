use serde::{Deserialize, Serialize, Serializer};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::scheduling::cost::round_to_cents;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "shift_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl ShiftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Scheduled => "scheduled",
            ShiftStatus::InProgress => "in_progress",
            ShiftStatus::Completed => "completed",
            ShiftStatus::Cancelled => "cancelled",
            ShiftStatus::NoShow => "no_show",
        }
    }
}

impl std::fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staff member booked to serve a participant over `[start_time, end_time)`.
///
/// The owning organization is reached through the participant; the row itself
/// carries no org column. `total_cost` is derived and stored unrounded.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Shift {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub staff_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub actual_start_time: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub actual_end_time: Option<OffsetDateTime>,
    pub service_type: String,
    pub location: String,
    pub status: ShiftStatus,
    pub hourly_rate: f64,
    #[serde(serialize_with = "serialize_cents")]
    pub total_cost: f64,
    pub notes: Option<String>,
    pub completion_notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>,
}

fn serialize_cents<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to_cents(*value))
}

/// Times arrive as text in any accepted layout; see `scheduling::timestamp`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateShiftRequest {
    pub participant_id: Uuid,
    pub staff_id: Uuid,
    pub start_time: String,
    pub end_time: String,
    #[validate(length(min = 1, message = "service_type is required"))]
    pub service_type: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    #[validate(range(exclusive_min = 0.0, message = "hourly_rate must be greater than 0"))]
    pub hourly_rate: f64,
    pub notes: Option<String>,
}

/// Partial edit. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateShiftRequest {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub actual_start_time: Option<String>,
    pub actual_end_time: Option<String>,
    #[validate(length(min = 1, message = "service_type cannot be empty"))]
    pub service_type: Option<String>,
    #[validate(length(min = 1, message = "location cannot be empty"))]
    pub location: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "hourly_rate must be greater than 0"))]
    pub hourly_rate: Option<f64>,
    pub notes: Option<String>,
    pub completion_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateShiftStatusRequest {
    pub status: ShiftStatus,
    pub completion_notes: Option<String>,
    pub actual_start_time: Option<String>,
    pub actual_end_time: Option<String>,
}

#[cfg(test)]
impl UpdateShiftStatusRequest {
    pub fn to(status: ShiftStatus) -> Self {
        Self {
            status,
            completion_notes: None,
            actual_start_time: None,
            actual_end_time: None,
        }
    }
}

/// Query string for `GET /api/shifts`.
#[derive(Debug, Default, Deserialize)]
pub struct ShiftListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub participant_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub status: Option<ShiftStatus>,
    pub service_type: Option<String>,
    pub start_date: Option<time::Date>,
    pub end_date: Option<time::Date>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShiftPage {
    pub shifts: Vec<Shift>,
    pub pagination: Pagination,
}
