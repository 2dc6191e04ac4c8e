//! Self-service registration. New accounts always get the `USER` role.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::state::AuthState;
use crate::{
    api::error::ApiError,
    auth::{
        identity::NewIdentity,
        store::CreateOutcome,
        validation::{normalize_email, normalize_username, validate_password, FieldErrors},
        Identity, Role,
    },
};

pub const EMAIL_TAKEN: &str = "Email already registered";
pub const USERNAME_TAKEN: &str = "Username already taken";

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub username: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Normalized and validated registration fields.
pub(crate) struct Registration {
    pub email: String,
    pub username: Option<String>,
    pub password: String,
}

/// Apply the normalization rules to the submitted fields.
///
/// # Errors
/// Returns every failing field at once.
pub(crate) fn validate(
    email: &str,
    username: Option<&str>,
    password: String,
) -> Result<Registration, FieldErrors> {
    let mut errors = FieldErrors::new();
    let email = errors.check("email", normalize_email(email));
    let username = errors.check("username", normalize_username(username));
    errors.check("password", validate_password(&password));

    match (email, username) {
        (Some(email), Some(username)) if errors.is_empty() => Ok(Registration {
            email,
            username,
            password,
        }),
        _ => Err(errors),
    }
}

/// Hash the password and insert the identity, mapping uniqueness conflicts.
pub(crate) async fn create_identity(
    auth_state: &AuthState,
    registration: Registration,
    role: Role,
) -> Result<Identity, ApiError> {
    let password_hash = auth_state
        .hasher()
        .hash_blocking(registration.password)
        .await?;
    let outcome = auth_state
        .store()
        .create(NewIdentity {
            email: registration.email,
            username: registration.username,
            password_hash: Some(password_hash),
            role,
        })
        .await?;

    match outcome {
        CreateOutcome::Created(identity) => Ok(identity),
        CreateOutcome::EmailTaken => Err(ApiError::Conflict(EMAIL_TAKEN)),
        CreateOutcome::UsernameTaken => Err(ApiError::Conflict(USERNAME_TAKEN)),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = Identity),
        (status = 400, description = "Validation failed or email/username taken"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Missing payload"));
    };

    let registration = validate(
        &request.email,
        request.username.as_deref(),
        request.password,
    )?;
    let identity = create_identity(&auth_state, registration, Role::User).await?;

    info!(subject = %identity.id, "Account registered");
    Ok((StatusCode::CREATED, Json(identity)))
}
