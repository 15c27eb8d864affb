//! Double-booking detection.
//!
//! The database query in `shift_repo` narrows candidates by staff member and
//! time window; the rules below decide what actually counts as a conflict.

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::error::ShiftError;
use crate::models::shift::ShiftStatus;

/// A half-open time window `[start, end)` with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl Interval {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, ShiftError> {
        if end <= start {
            return Err(ShiftError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    pub fn end(&self) -> OffsetDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Touching windows (one ends exactly when the other starts) do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl ShiftStatus {
    /// Whether a shift in this status still occupies its staff member's calendar.
    pub fn occupies_calendar(&self) -> bool {
        !matches!(self, ShiftStatus::Cancelled | ShiftStatus::Completed)
    }
}

/// An existing booking as loaded for a conflict check.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookedShift {
    pub id: Uuid,
    pub status: ShiftStatus,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
}

impl BookedShift {
    // Stored rows satisfy `end_time > start_time` (table CHECK constraint).
    fn window(&self) -> Interval {
        Interval {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Returns the first booking that collides with `candidate`.
///
/// `exclude` skips the shift being rescheduled so it never conflicts with
/// its own previous window.
pub fn find_conflict<'a, I>(candidate: &Interval, booked: I, exclude: Option<Uuid>) -> Option<Uuid>
where
    I: IntoIterator<Item = &'a BookedShift>,
{
    booked
        .into_iter()
        .filter(|b| Some(b.id) != exclude)
        .filter(|b| b.status.occupies_calendar())
        .find(|b| b.window().overlaps(candidate))
        .map(|b| b.id)
}
