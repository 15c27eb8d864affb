//! Transactional shift operations.
//!
//! Each mutation runs in a single transaction: load and lock, authorize,
//! plan with the rules in `scheduling`, check the staff calendar, write. Any
//! early return drops the transaction and rolls everything back.

use sqlx::{PgConnection, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::Result,
    models::{
        common::{PageRequest, MAX_PAGE_LIMIT, MAX_PAGE_LIMIT_ADMIN},
        shift::{
            CreateShiftRequest, Pagination, Shift, ShiftListParams, ShiftPage,
            UpdateShiftRequest, UpdateShiftStatusRequest,
        },
    },
    org_guard,
    scheduling::{
        conflict::{find_conflict, BookedShift, Interval},
        edit::{ShiftChanges, ShiftDraft},
        lifecycle::{ensure_deletable, plan_status_change, StatusOutcome},
        policy::{authorize, OrgScope, ShiftAction},
        ShiftError,
    },
};

const SHIFT_COLUMNS: &str = "id, participant_id, staff_id, start_time, end_time, \
     actual_start_time, actual_end_time, service_type, location, status, \
     hourly_rate, total_cost, notes, completion_notes, created_at, updated_at, deleted_at";

const SCOPED_SHIFT_COLUMNS: &str = "s.id, s.participant_id, s.staff_id, s.start_time, s.end_time, \
     s.actual_start_time, s.actual_end_time, s.service_type, s.location, s.status, \
     s.hourly_rate, s.total_cost, s.notes, s.completion_notes, s.created_at, s.updated_at, \
     s.deleted_at";

// Binds: $1 org (NULL = all orgs), $2 participant, $3 staff, $4 status,
// $5 service type, $6 earliest start, $7 start upper bound (exclusive).
const LIST_FILTER: &str = r#"
    FROM shifts s
    JOIN participants p ON p.id = s.participant_id
    WHERE s.deleted_at IS NULL
      AND ($1::uuid IS NULL OR p.org_id = $1)
      AND ($2::uuid IS NULL OR s.participant_id = $2)
      AND ($3::uuid IS NULL OR s.staff_id = $3)
      AND ($4::shift_status IS NULL OR s.status = $4)
      AND ($5::text IS NULL OR s.service_type = $5)
      AND ($6::timestamptz IS NULL OR s.start_time >= $6)
      AND ($7::timestamptz IS NULL OR s.start_time < $7)
"#;

pub async fn get(pool: &PgPool, actor: &AuthUser, id: Uuid) -> Result<Shift> {
    authorize(actor, ShiftAction::View, None)?;
    let scope = actor.scope_for(ShiftAction::View);

    let shift = sqlx::query_as::<_, Shift>(&format!(
        r#"
        SELECT {SCOPED_SHIFT_COLUMNS}
        FROM shifts s
        JOIN participants p ON p.id = s.participant_id
        WHERE s.id = $1 AND s.deleted_at IS NULL
          AND ($2::uuid IS NULL OR p.org_id = $2)
        "#
    ))
    .bind(id)
    .bind(scope.org_id())
    .fetch_optional(pool)
    .await?
    .ok_or(ShiftError::NotFound(id))?;

    Ok(shift)
}

pub async fn list(pool: &PgPool, actor: &AuthUser, params: &ShiftListParams) -> Result<ShiftPage> {
    authorize(actor, ShiftAction::View, None)?;
    let scope = actor.scope_for(ShiftAction::View);

    let max_limit = if actor.role.is_admin() || actor.platform_admin {
        MAX_PAGE_LIMIT_ADMIN
    } else {
        MAX_PAGE_LIMIT
    };
    let page = PageRequest::new(params.page, params.limit, max_limit);

    let from = params.start_date.map(|d| d.midnight().assume_utc());
    let until = params
        .end_date
        .and_then(|d| d.next_day())
        .map(|d| d.midnight().assume_utc());

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {LIST_FILTER}"))
        .bind(scope.org_id())
        .bind(params.participant_id)
        .bind(params.staff_id)
        .bind(params.status)
        .bind(params.service_type.as_deref())
        .bind(from)
        .bind(until)
        .fetch_one(pool)
        .await?;

    let shifts = sqlx::query_as::<_, Shift>(&format!(
        "SELECT {SCOPED_SHIFT_COLUMNS} {LIST_FILTER} ORDER BY s.start_time DESC LIMIT $8 OFFSET $9"
    ))
    .bind(scope.org_id())
    .bind(params.participant_id)
    .bind(params.staff_id)
    .bind(params.status)
    .bind(params.service_type.as_deref())
    .bind(from)
    .bind(until)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok(ShiftPage {
        shifts,
        pagination: Pagination {
            page: page.page,
            limit: page.limit,
            total,
            total_pages: page.total_pages(total),
        },
    })
}

pub async fn create(pool: &PgPool, actor: &AuthUser, req: &CreateShiftRequest) -> Result<Shift> {
    authorize(actor, ShiftAction::Create, None)?;
    let draft = ShiftDraft::from_request(req)?;

    let mut tx = pool.begin().await?;

    // 1. Both people must be active members of the caller's org.
    org_guard::verify_participant(&mut tx, draft.participant_id, actor.org_id).await?;
    org_guard::verify_staff(&mut tx, draft.staff_id, actor.org_id).await?;

    // 2. Serialize bookings for this staff member, then check the calendar.
    lock_staff_calendar(&mut tx, draft.staff_id).await?;
    ensure_calendar_free(&mut tx, draft.staff_id, &draft.window, None).await?;

    // 3. Insert.
    let shift = sqlx::query_as::<_, Shift>(&format!(
        r#"
        INSERT INTO shifts
            (id, participant_id, staff_id, start_time, end_time, service_type,
             location, status, hourly_rate, total_cost, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'scheduled', $8, $9, $10)
        RETURNING {SHIFT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(draft.participant_id)
    .bind(draft.staff_id)
    .bind(draft.window.start())
    .bind(draft.window.end())
    .bind(&draft.service_type)
    .bind(&draft.location)
    .bind(draft.hourly_rate)
    .bind(draft.total_cost)
    .bind(&draft.notes)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        shift_id = %shift.id,
        staff_id = %shift.staff_id,
        org_id = %actor.org_id,
        actor_id = %actor.id,
        "Shift created"
    );
    Ok(shift)
}

pub async fn update(
    pool: &PgPool,
    actor: &AuthUser,
    id: Uuid,
    req: &UpdateShiftRequest,
) -> Result<Shift> {
    authorize(actor, ShiftAction::Edit, None)?;

    let mut tx = pool.begin().await?;
    let existing = fetch_for_update(&mut tx, id, actor.scope_for(ShiftAction::Edit)).await?;

    let changes = ShiftChanges::plan(&existing, req)?;
    if changes.is_empty() {
        return Ok(existing);
    }

    if let Some(window) = changes.window.filter(|_| changes.check_conflicts) {
        lock_staff_calendar(&mut tx, existing.staff_id).await?;
        ensure_calendar_free(&mut tx, existing.staff_id, &window, Some(id)).await?;
    }

    let shift = sqlx::query_as::<_, Shift>(&format!(
        r#"
        UPDATE shifts
        SET start_time        = COALESCE($2, start_time),
            end_time          = COALESCE($3, end_time),
            actual_start_time = COALESCE($4, actual_start_time),
            actual_end_time   = COALESCE($5, actual_end_time),
            service_type      = COALESCE($6, service_type),
            location          = COALESCE($7, location),
            hourly_rate       = COALESCE($8, hourly_rate),
            total_cost        = COALESCE($9, total_cost),
            notes             = COALESCE($10, notes),
            completion_notes  = COALESCE($11, completion_notes),
            updated_at        = NOW()
        WHERE id = $1
        RETURNING {SHIFT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.start_time)
    .bind(changes.end_time)
    .bind(changes.actual_start_time)
    .bind(changes.actual_end_time)
    .bind(&changes.service_type)
    .bind(&changes.location)
    .bind(changes.hourly_rate)
    .bind(changes.total_cost)
    .bind(&changes.notes)
    .bind(&changes.completion_notes)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        shift_id = %id,
        actor_id = %actor.id,
        rescheduled = changes.window.is_some(),
        "Shift updated"
    );
    Ok(shift)
}

pub async fn set_status(
    pool: &PgPool,
    actor: &AuthUser,
    id: Uuid,
    req: &UpdateShiftStatusRequest,
    now: OffsetDateTime,
) -> Result<Shift> {
    let action = ShiftAction::SetStatus(req.status);

    let mut tx = pool.begin().await?;
    let shift = fetch_for_update(&mut tx, id, actor.scope_for(action)).await?;
    authorize(actor, action, Some(shift.staff_id))?;

    let change = match plan_status_change(&shift, req, now)? {
        StatusOutcome::Unchanged => return Ok(shift),
        StatusOutcome::Changed(change) => change,
    };

    // A cancelled shift coming back must not land on top of a newer booking.
    if change.reoccupies_calendar() {
        let window = Interval::new(shift.start_time, shift.end_time)?;
        lock_staff_calendar(&mut tx, shift.staff_id).await?;
        ensure_calendar_free(&mut tx, shift.staff_id, &window, Some(id)).await?;
    }

    let updated = sqlx::query_as::<_, Shift>(&format!(
        r#"
        UPDATE shifts
        SET status            = $2,
            actual_start_time = COALESCE($3, actual_start_time),
            actual_end_time   = COALESCE($4, actual_end_time),
            completion_notes  = COALESCE($5, completion_notes),
            updated_at        = NOW()
        WHERE id = $1
        RETURNING {SHIFT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(change.to)
    .bind(change.actual_start_time)
    .bind(change.actual_end_time)
    .bind(&change.completion_notes)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        shift_id = %id,
        actor_id = %actor.id,
        from = %change.from,
        to = %change.to,
        "Shift status changed"
    );
    Ok(updated)
}

/// Soft delete. The row stays for billing history but drops out of every
/// read and conflict check.
pub async fn delete(pool: &PgPool, actor: &AuthUser, id: Uuid) -> Result<()> {
    authorize(actor, ShiftAction::Delete, None)?;

    let mut tx = pool.begin().await?;
    let shift = fetch_for_update(&mut tx, id, actor.scope_for(ShiftAction::Delete)).await?;
    ensure_deletable(&shift)?;

    sqlx::query("UPDATE shifts SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(shift_id = %id, actor_id = %actor.id, "Shift deleted");
    Ok(())
}

/// Loads a live shift within `scope` and row-locks it for the rest of the
/// transaction. Out-of-scope rows look exactly like missing ones.
async fn fetch_for_update(conn: &mut PgConnection, id: Uuid, scope: OrgScope) -> Result<Shift> {
    let shift = sqlx::query_as::<_, Shift>(&format!(
        r#"
        SELECT {SCOPED_SHIFT_COLUMNS}
        FROM shifts s
        JOIN participants p ON p.id = s.participant_id
        WHERE s.id = $1 AND s.deleted_at IS NULL
          AND ($2::uuid IS NULL OR p.org_id = $2)
        FOR UPDATE OF s
        "#
    ))
    .bind(id)
    .bind(scope.org_id())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(ShiftError::NotFound(id))?;

    Ok(shift)
}

/// Transaction-scoped advisory lock on one staff member's calendar, released
/// at commit or rollback. Concurrent bookings for the same person queue here.
async fn lock_staff_calendar(conn: &mut PgConnection, staff_id: Uuid) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::uuid::text, 0))")
        .bind(staff_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn ensure_calendar_free(
    conn: &mut PgConnection,
    staff_id: Uuid,
    window: &Interval,
    exclude: Option<Uuid>,
) -> Result<()> {
    let booked = sqlx::query_as::<_, BookedShift>(
        r#"
        SELECT id, status, start_time, end_time
        FROM shifts
        WHERE staff_id = $1
          AND deleted_at IS NULL
          AND status NOT IN ('cancelled', 'completed')
          AND start_time < $3
          AND end_time > $2
        "#,
    )
    .bind(staff_id)
    .bind(window.start())
    .bind(window.end())
    .fetch_all(&mut *conn)
    .await?;

    match find_conflict(window, &booked, exclude) {
        Some(conflicting_shift_id) => {
            tracing::warn!(
                staff_id = %staff_id,
                conflicting_shift_id = %conflicting_shift_id,
                "Booking rejected: staff calendar conflict"
            );
            Err(ShiftError::ScheduleConflict {
                staff_id,
                conflicting_shift_id,
            }
            .into())
        }
        None => Ok(()),
    }
}
