pub mod auth;
pub mod dashboard;
pub mod feedback;
pub mod health;
pub mod progress;
pub mod questions;
pub mod stats;
pub mod users;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Parse a UUID path segment, mapping garbage to a 400.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest("Invalid id"))
}

/// Trim an optional text field, treating blank as absent.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Map a write error, treating a foreign key violation as a session whose
/// account no longer exists.
pub(crate) fn write_error(err: sqlx::Error) -> ApiError {
    let orphaned = match &err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23503"),
        _ => false,
    };
    if orphaned {
        ApiError::Unauthenticated
    } else {
        err.into()
    }
}
