//! Who may do what to a shift.
//!
//! | action                            | admin, manager | care_worker, support_coordinator |
//! |-----------------------------------|----------------|----------------------------------|
//! | view, list                        | own org        | own org                          |
//! | delete (status guarded)           | own org        | own org                          |
//! | create, edit                      | own org        | never                            |
//! | status to in_progress, completed  | own org        | own assigned shift only          |
//! | status to cancelled, no_show, scheduled | own org  | never                            |
//!
//! The platform-admin capability lifts the organization boundary for viewing
//! and editing only; everything else stays scoped to the caller's own org.

use uuid::Uuid;

use super::error::ShiftError;
use crate::auth::AuthUser;
use crate::models::shift::ShiftStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftAction {
    View,
    Create,
    Edit,
    Delete,
    SetStatus(ShiftStatus),
}

/// Rows visible to an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgScope {
    Org(Uuid),
    All,
}

impl OrgScope {
    /// `None` means unrestricted; bound straight into `($n::uuid IS NULL OR ...)`.
    pub fn org_id(&self) -> Option<Uuid> {
        match self {
            OrgScope::Org(id) => Some(*id),
            OrgScope::All => None,
        }
    }
}

impl AuthUser {
    pub fn scope_for(&self, action: ShiftAction) -> OrgScope {
        match action {
            ShiftAction::View | ShiftAction::Edit if self.platform_admin => OrgScope::All,
            _ => OrgScope::Org(self.org_id),
        }
    }
}

/// Checks `action` for `actor`. `assigned_staff` is the shift's staff member
/// when the action targets an existing shift.
pub fn authorize(
    actor: &AuthUser,
    action: ShiftAction,
    assigned_staff: Option<Uuid>,
) -> Result<(), ShiftError> {
    let full = actor.role.can_manage_shifts();
    let own = assigned_staff == Some(actor.id);

    match action {
        // Deletion is limited by status and org scope, not by role.
        ShiftAction::View | ShiftAction::Delete => Ok(()),
        ShiftAction::Edit if full || actor.platform_admin => Ok(()),
        ShiftAction::Create | ShiftAction::Edit if full => Ok(()),
        ShiftAction::Create | ShiftAction::Edit => Err(ShiftError::InsufficientPermissions(
            "Only managers and admins can schedule or edit shifts",
        )),
        ShiftAction::SetStatus(_) if full => Ok(()),
        ShiftAction::SetStatus(_) if !own => Err(ShiftError::InsufficientPermissions(
            "You can only modify your own assigned shifts",
        )),
        ShiftAction::SetStatus(ShiftStatus::InProgress | ShiftStatus::Completed) => Ok(()),
        ShiftAction::SetStatus(_) => Err(ShiftError::InsufficientPermissions(
            "Only managers and admins can cancel, reschedule or mark shifts as no-show",
        )),
    }
}
