//! Org-boundary checks for the people a shift references.
//!
//! Each check runs on the caller's open transaction and fails with the same
//! error whether the record is missing, inactive or owned by another org, so
//! nothing leaks about other tenants.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::scheduling::ShiftError;

pub async fn verify_participant(
    conn: &mut PgConnection,
    participant_id: Uuid,
    org_id: Uuid,
) -> Result<()> {
    let ok: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM participants
            WHERE id = $1 AND org_id = $2 AND is_active = true AND deleted_at IS NULL
        )
        "#,
    )
    .bind(participant_id)
    .bind(org_id)
    .fetch_one(&mut *conn)
    .await?;

    if !ok {
        return Err(ShiftError::InvalidParticipant(participant_id).into());
    }
    Ok(())
}

pub async fn verify_staff(conn: &mut PgConnection, staff_id: Uuid, org_id: Uuid) -> Result<()> {
    let ok: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND org_id = $2 AND is_active = true)",
    )
    .bind(staff_id)
    .bind(org_id)
    .fetch_one(&mut *conn)
    .await?;

    if !ok {
        return Err(ShiftError::InvalidStaff(staff_id).into());
    }
    Ok(())
}
