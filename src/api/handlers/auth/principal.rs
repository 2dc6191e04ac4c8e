//! Per-request session resolution and role checks.
//!
//! Handlers call [`require`] before anything else so denials never reach the
//! database.

use axum::http::HeaderMap;

use super::state::AuthState;
use crate::{
    api::error::ApiError,
    auth::{guard, Role, SessionClaims},
};

/// Claims from the request, if it carries a valid session.
#[must_use]
pub fn read(headers: &HeaderMap, auth_state: &AuthState) -> Option<SessionClaims> {
    auth_state.keys().read(headers)
}

/// Resolve the session and check it against `roles`.
///
/// # Errors
/// `ApiError::Unauthenticated` without a session, `ApiError::Forbidden` when
/// the role is not in `roles`.
pub fn require(
    headers: &HeaderMap,
    auth_state: &AuthState,
    roles: &[Role],
) -> Result<SessionClaims, ApiError> {
    let claims = read(headers, auth_state);
    guard::require(claims.as_ref(), roles)?;
    claims.ok_or(ApiError::Unauthenticated)
}
