//! Turns create/edit requests into validated values ready to persist.

use time::OffsetDateTime;
use uuid::Uuid;

use super::conflict::Interval;
use super::cost::shift_cost;
use super::error::ShiftError;
use super::timestamp::{parse_optional, parse_timestamp};
use crate::models::shift::{CreateShiftRequest, Shift, UpdateShiftRequest};

/// A new booking, times parsed and cost derived.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftDraft {
    pub participant_id: Uuid,
    pub staff_id: Uuid,
    pub window: Interval,
    pub service_type: String,
    pub location: String,
    pub hourly_rate: f64,
    pub total_cost: f64,
    pub notes: Option<String>,
}

impl ShiftDraft {
    pub fn from_request(req: &CreateShiftRequest) -> Result<Self, ShiftError> {
        let start = parse_timestamp("start_time", &req.start_time)?;
        let end = parse_timestamp("end_time", &req.end_time)?;
        let window = Interval::new(start, end)?;

        Ok(Self {
            participant_id: req.participant_id,
            staff_id: req.staff_id,
            window,
            service_type: req.service_type.clone(),
            location: req.location.clone(),
            hourly_rate: req.hourly_rate,
            total_cost: shift_cost(&window, req.hourly_rate),
            notes: req.notes.clone(),
        })
    }
}

/// Column deltas for a partial edit. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftChanges {
    pub start_time: Option<OffsetDateTime>,
    pub end_time: Option<OffsetDateTime>,
    pub actual_start_time: Option<OffsetDateTime>,
    pub actual_end_time: Option<OffsetDateTime>,
    pub service_type: Option<String>,
    pub location: Option<String>,
    pub hourly_rate: Option<f64>,
    pub total_cost: Option<f64>,
    pub notes: Option<String>,
    pub completion_notes: Option<String>,
    /// The window after the edit, for the double-booking check.
    pub window: Option<Interval>,
    pub check_conflicts: bool,
}

impl ShiftChanges {
    /// Merges `req` over `existing`.
    ///
    /// The merged window must still satisfy `end > start`. Cost is recomputed
    /// whenever start, end or rate was supplied. Conflicts are only re-checked
    /// when timing moved and the shift still holds its calendar slot.
    pub fn plan(existing: &Shift, req: &UpdateShiftRequest) -> Result<Self, ShiftError> {
        let start_time = parse_optional("start_time", req.start_time.as_deref())?;
        let end_time = parse_optional("end_time", req.end_time.as_deref())?;
        let actual_start_time =
            parse_optional("actual_start_time", req.actual_start_time.as_deref())?;
        let actual_end_time = parse_optional("actual_end_time", req.actual_end_time.as_deref())?;

        let window = Interval::new(
            start_time.unwrap_or(existing.start_time),
            end_time.unwrap_or(existing.end_time),
        )?;

        let timing_changed = start_time.is_some() || end_time.is_some();
        let total_cost = (timing_changed || req.hourly_rate.is_some())
            .then(|| shift_cost(&window, req.hourly_rate.unwrap_or(existing.hourly_rate)));

        Ok(Self {
            start_time,
            end_time,
            actual_start_time,
            actual_end_time,
            service_type: req.service_type.clone(),
            location: req.location.clone(),
            hourly_rate: req.hourly_rate,
            total_cost,
            notes: req.notes.clone(),
            completion_notes: req.completion_notes.clone(),
            window: timing_changed.then_some(window),
            check_conflicts: timing_changed && existing.status.occupies_calendar(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.start_time.is_none()
            && self.end_time.is_none()
            && self.actual_start_time.is_none()
            && self.actual_end_time.is_none()
            && self.service_type.is_none()
            && self.location.is_none()
            && self.hourly_rate.is_none()
            && self.notes.is_none()
            && self.completion_notes.is_none()
    }
}
