//! Shift status state machine.
//!
//! ```text
//! scheduled   -> in_progress | cancelled | no_show
//! in_progress -> completed | cancelled
//! completed   -> (terminal)
//! cancelled   -> scheduled
//! no_show     -> scheduled
//! ```
//!
//! Requesting the current status is always accepted and changes nothing.

use time::{Duration, OffsetDateTime};

use super::error::ShiftError;
use super::timestamp::parse_optional;
use crate::models::shift::{Shift, ShiftStatus, UpdateShiftStatusRequest};

/// How far ahead of the scheduled start a shift may be started.
pub const EARLY_START_GRACE: Duration = Duration::minutes(30);

impl ShiftStatus {
    pub fn allowed_targets(&self) -> &'static [ShiftStatus] {
        use ShiftStatus::*;
        match self {
            Scheduled => &[InProgress, Cancelled, NoShow],
            InProgress => &[Completed, Cancelled],
            Completed => &[],
            Cancelled => &[Scheduled],
            NoShow => &[Scheduled],
        }
    }

    pub fn can_transition_to(&self, target: ShiftStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Only shifts that never started (or were called off) may be removed.
    pub fn is_deletable(&self) -> bool {
        matches!(self, ShiftStatus::Scheduled | ShiftStatus::Cancelled)
    }
}

/// Rejects starting a shift more than [`EARLY_START_GRACE`] before it is due.
/// Late starts are always fine.
pub fn check_start_time(
    scheduled_start: OffsetDateTime,
    now: OffsetDateTime,
) -> Result<(), ShiftError> {
    if now < scheduled_start - EARLY_START_GRACE {
        return Err(ShiftError::TooEarlyToStart {
            minutes_early: (scheduled_start - now).whole_minutes(),
        });
    }
    Ok(())
}

pub fn ensure_deletable(shift: &Shift) -> Result<(), ShiftError> {
    if !shift.status.is_deletable() {
        return Err(ShiftError::InvalidOperation(
            "Only scheduled or cancelled shifts can be deleted",
        ));
    }
    Ok(())
}

/// Field values to write for an accepted transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub from: ShiftStatus,
    pub to: ShiftStatus,
    pub actual_start_time: Option<OffsetDateTime>,
    pub actual_end_time: Option<OffsetDateTime>,
    pub completion_notes: Option<String>,
}

impl StatusChange {
    /// A reactivated shift takes its calendar slot back, so it must be
    /// re-checked for double booking.
    pub fn reoccupies_calendar(&self) -> bool {
        !self.from.occupies_calendar() && self.to.occupies_calendar()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusOutcome {
    /// Requested status equals the current one; nothing is written.
    Unchanged,
    Changed(StatusChange),
}

/// Validates `req` against `shift` at time `now` and works out the writes.
///
/// Caller-supplied actual times win; otherwise entering `in_progress` stamps
/// `actual_start_time` and entering `completed` stamps `actual_end_time` with
/// `now`, unless the shift already carries a value.
pub fn plan_status_change(
    shift: &Shift,
    req: &UpdateShiftStatusRequest,
    now: OffsetDateTime,
) -> Result<StatusOutcome, ShiftError> {
    let from = shift.status;
    let to = req.status;

    if from == to {
        return Ok(StatusOutcome::Unchanged);
    }
    if !from.can_transition_to(to) {
        return Err(ShiftError::InvalidTransition { from, to });
    }
    if from == ShiftStatus::Scheduled && to == ShiftStatus::InProgress {
        check_start_time(shift.start_time, now)?;
    }

    let mut actual_start_time =
        parse_optional("actual_start_time", req.actual_start_time.as_deref())?;
    let mut actual_end_time = parse_optional("actual_end_time", req.actual_end_time.as_deref())?;

    if to == ShiftStatus::InProgress && actual_start_time.is_none() && shift.actual_start_time.is_none()
    {
        actual_start_time = Some(now);
    }
    if to == ShiftStatus::Completed && actual_end_time.is_none() && shift.actual_end_time.is_none() {
        actual_end_time = Some(now);
    }

    Ok(StatusOutcome::Changed(StatusChange {
        from,
        to,
        actual_start_time,
        actual_end_time,
        completion_notes: req.completion_notes.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;
    use ShiftStatus::*;

    const ALL: [ShiftStatus; 5] = [Scheduled, InProgress, Completed, Cancelled, NoShow];

    fn shift(status: ShiftStatus) -> Shift {
        let start = datetime!(2024-03-01 09:00 UTC);
        Shift {
            id: Uuid::new_v4(),
            participant_id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            start_time: start,
            end_time: datetime!(2024-03-01 17:00 UTC),
            actual_start_time: None,
            actual_end_time: None,
            service_type: "personal_care".into(),
            location: "Home".into(),
            status,
            hourly_rate: 45.5,
            total_cost: 364.0,
            notes: None,
            completion_notes: None,
            created_at: start - Duration::days(7),
            updated_at: start - Duration::days(7),
            deleted_at: None,
        }
    }

    #[test]
    fn transition_table_matches_graph() {
        let edges: Vec<(ShiftStatus, ShiftStatus)> = ALL
            .iter()
            .flat_map(|f| ALL.iter().map(move |t| (*f, *t)))
            .filter(|(f, t)| f.can_transition_to(*t))
            .collect();
        assert_eq!(
            edges,
            vec![
                (Scheduled, InProgress),
                (Scheduled, Cancelled),
                (Scheduled, NoShow),
                (InProgress, Completed),
                (InProgress, Cancelled),
                (Cancelled, Scheduled),
                (NoShow, Scheduled),
            ]
        );
        assert!(Completed.allowed_targets().is_empty());
    }

    #[test]
    fn scheduled_cannot_jump_to_completed() {
        let err = plan_status_change(
            &shift(Scheduled),
            &UpdateShiftStatusRequest::to(Completed),
            datetime!(2024-03-01 12:00 UTC),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ShiftError::InvalidTransition {
                from: Scheduled,
                to: Completed,
            }
        );
    }

    #[test]
    fn completed_is_final() {
        for target in [Scheduled, InProgress, Cancelled, NoShow] {
            let res = plan_status_change(
                &shift(Completed),
                &UpdateShiftStatusRequest::to(target),
                datetime!(2024-03-01 18:00 UTC),
            );
            assert!(matches!(res, Err(ShiftError::InvalidTransition { .. })));
        }
    }

    #[test]
    fn reasserting_current_status_is_a_no_op() {
        for status in ALL {
            let mut req = UpdateShiftStatusRequest::to(status);
            req.completion_notes = Some("ignored".into());
            let res = plan_status_change(&shift(status), &req, datetime!(2024-02-01 00:00 UTC));
            assert_eq!(res, Ok(StatusOutcome::Unchanged), "status {status}");
        }
    }

    #[test]
    fn starting_45_minutes_early_is_rejected() {
        let err = plan_status_change(
            &shift(Scheduled),
            &UpdateShiftStatusRequest::to(InProgress),
            datetime!(2024-03-01 08:15 UTC),
        )
        .unwrap_err();
        assert_eq!(err, ShiftError::TooEarlyToStart { minutes_early: 45 });
    }

    #[test]
    fn starting_20_minutes_early_stamps_actual_start() {
        let now = datetime!(2024-03-01 08:40 UTC);
        let res = plan_status_change(
            &shift(Scheduled),
            &UpdateShiftStatusRequest::to(InProgress),
            now,
        )
        .unwrap();
        let StatusOutcome::Changed(change) = res else {
            panic!("expected a change");
        };
        assert_eq!(change.actual_start_time, Some(now));
        assert_eq!(change.actual_end_time, None);
    }

    #[test]
    fn early_start_boundary_is_inclusive() {
        let start = datetime!(2024-03-01 09:00 UTC);
        assert!(check_start_time(start, start - EARLY_START_GRACE).is_ok());
        assert!(check_start_time(start, start - EARLY_START_GRACE - Duration::seconds(1)).is_err());
        assert!(check_start_time(start, start + Duration::hours(3)).is_ok());
    }

    #[test]
    fn supplied_actual_start_wins_over_stamp() {
        let mut req = UpdateShiftStatusRequest::to(InProgress);
        req.actual_start_time = Some("2024-03-01 08:55".into());
        let res = plan_status_change(&shift(Scheduled), &req, datetime!(2024-03-01 09:05 UTC));
        let Ok(StatusOutcome::Changed(change)) = res else {
            panic!("expected a change");
        };
        assert_eq!(change.actual_start_time, Some(datetime!(2024-03-01 08:55 UTC)));
    }

    #[test]
    fn existing_actual_start_is_not_overwritten() {
        let mut s = shift(Scheduled);
        s.actual_start_time = Some(datetime!(2024-03-01 08:50 UTC));
        let res = plan_status_change(
            &s,
            &UpdateShiftStatusRequest::to(InProgress),
            datetime!(2024-03-01 09:00 UTC),
        );
        let Ok(StatusOutcome::Changed(change)) = res else {
            panic!("expected a change");
        };
        assert_eq!(change.actual_start_time, None);
    }

    #[test]
    fn completing_stamps_actual_end_and_keeps_notes() {
        let now = datetime!(2024-03-01 17:02 UTC);
        let mut req = UpdateShiftStatusRequest::to(Completed);
        req.completion_notes = Some("All tasks done".into());
        let res = plan_status_change(&shift(InProgress), &req, now).unwrap();
        let StatusOutcome::Changed(change) = res else {
            panic!("expected a change");
        };
        assert_eq!(change.actual_end_time, Some(now));
        assert_eq!(change.completion_notes.as_deref(), Some("All tasks done"));
        assert!(!change.reoccupies_calendar());
    }

    #[test]
    fn unparseable_actual_time_is_rejected() {
        let mut req = UpdateShiftStatusRequest::to(Completed);
        req.actual_end_time = Some("five pm".into());
        let err = plan_status_change(&shift(InProgress), &req, datetime!(2024-03-01 17:00 UTC))
            .unwrap_err();
        assert!(matches!(
            err,
            ShiftError::InvalidTimeFormat {
                field: "actual_end_time",
                ..
            }
        ));
    }

    #[test]
    fn reactivation_reoccupies_calendar() {
        for from in [Cancelled, NoShow] {
            let res = plan_status_change(
                &shift(from),
                &UpdateShiftStatusRequest::to(Scheduled),
                datetime!(2024-02-01 00:00 UTC),
            );
            let Ok(StatusOutcome::Changed(change)) = res else {
                panic!("expected a change");
            };
            // a no_show shift never released its slot
            assert_eq!(change.reoccupies_calendar(), from == Cancelled);
        }
    }

    #[test]
    fn only_scheduled_or_cancelled_can_be_deleted() {
        assert!(ensure_deletable(&shift(Scheduled)).is_ok());
        assert!(ensure_deletable(&shift(Cancelled)).is_ok());
        for status in [InProgress, Completed, NoShow] {
            assert!(matches!(
                ensure_deletable(&shift(status)),
                Err(ShiftError::InvalidOperation(_))
            ));
        }
    }
}
