//! Error-to-HTTP mapping shared by every handler.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::{
    credentials::AuthFailure, guard::Denial, password::PasswordError, session::SessionError,
    validation::FieldErrors,
};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug)]
pub enum ApiError {
    /// Any credential rejection. Renders the same body whatever the cause.
    InvalidCredentials,
    Unauthenticated,
    Forbidden,
    Validation(FieldErrors),
    Conflict(&'static str),
    BadRequest(&'static str),
    NotFound(&'static str),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": INVALID_CREDENTIALS }),
            ),
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Authentication required" }),
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": "Forbidden" })),
            Self::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "fields": fields }),
            ),
            Self::Conflict(message) | Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            Self::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            Self::Internal(err) => {
                error!("Internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => Self::Unauthenticated,
            Denial::Forbidden => Self::Forbidden,
        }
    }
}

impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        if failure.is_credential_failure() {
            Self::InvalidCredentials
        } else {
            Self::Internal(failure.into())
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(fields: FieldErrors) -> Self {
        Self::Validation(fields)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.into())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self::Internal(err.into())
    }
}
