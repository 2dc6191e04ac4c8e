//! Authorization Guard.
//!
//! Decisions depend only on the claims and the role set named by the
//! operation. Role sets are matched exactly; `SuperAdmin` does not imply
//! `Admin`. The account-management rules (`ensure_can_*`) layer on top of the
//! coarse role-set check.

use thiserror::Error;

use super::{role::Role, session::SessionClaims};

/// Any authenticated identity.
pub const ANY_ROLE: &[Role] = &[Role::User, Role::Admin, Role::SuperAdmin];
/// Admin-tier operations.
pub const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];
/// Super-admin-tier operations.
pub const SUPER_ADMIN_ONLY: &[Role] = &[Role::SuperAdmin];

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum Denial {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(Denial),
}

/// Decide whether `claims` satisfy `required`.
#[must_use]
pub fn authorize(claims: Option<&SessionClaims>, required: &[Role]) -> Decision {
    match claims {
        None => Decision::Denied(Denial::Unauthenticated),
        Some(claims) if required.contains(&claims.role) => Decision::Allowed,
        Some(_) => Decision::Denied(Denial::Forbidden),
    }
}

/// [`authorize`] as a `Result`, handing back the claims when allowed.
///
/// # Errors
/// Returns the `Denial` reason.
pub fn require<'a>(
    claims: Option<&'a SessionClaims>,
    required: &[Role],
) -> Result<&'a SessionClaims, Denial> {
    match (authorize(claims, required), claims) {
        (Decision::Allowed, Some(claims)) => Ok(claims),
        (Decision::Denied(denial), _) => Err(denial),
        (Decision::Allowed, None) => Err(Denial::Unauthenticated),
    }
}

/// Self-service resources belong to exactly one subject, whatever its role.
///
/// # Errors
/// Returns `Denial::Forbidden` when `owner_id` is not the acting subject.
pub fn ensure_owner(claims: &SessionClaims, owner_id: &str) -> Result<(), Denial> {
    if claims.subject_id == owner_id {
        Ok(())
    } else {
        Err(Denial::Forbidden)
    }
}

/// Who may create an account holding `target`.
const fn creators_of(target: Role) -> &'static [Role] {
    match target {
        Role::User => ADMIN_ROLES,
        Role::Admin | Role::SuperAdmin => SUPER_ADMIN_ONLY,
    }
}

/// Escalation guard for account creation.
///
/// # Errors
/// Returns `Denial::Forbidden` when the actor may not mint `target`.
pub fn ensure_can_create(actor: &SessionClaims, target: Role) -> Result<(), Denial> {
    require(Some(actor), creators_of(target)).map(|_| ())
}

/// Deletion guard. Super admin accounts are never deletable here.
///
/// # Errors
/// Returns `Denial::Forbidden` when the target is protected or outranks the actor.
pub fn ensure_can_delete(actor: &SessionClaims, target: Role) -> Result<(), Denial> {
    match target {
        Role::SuperAdmin => Err(Denial::Forbidden),
        Role::Admin => require(Some(actor), SUPER_ADMIN_ONLY).map(|_| ()),
        Role::User => require(Some(actor), ADMIN_ROLES).map(|_| ()),
    }
}

/// Editing a privileged account, or granting a privileged role, is
/// super-admin-only.
///
/// # Errors
/// Returns `Denial::Forbidden` when either role requires more than the actor has.
pub fn ensure_can_edit(
    actor: &SessionClaims,
    current: Role,
    requested: Option<Role>,
) -> Result<(), Denial> {
    require(Some(actor), creators_of(current))?;
    if let Some(requested) = requested {
        require(Some(actor), creators_of(requested))?;
    }
    Ok(())
}
