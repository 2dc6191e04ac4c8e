//! Account management for the admin tiers.
//!
//! Flow Overview:
//! 1) Resolve the session and check the coarse role set for the route.
//! 2) Apply the account rules: only super admins create, edit or delete
//!    privileged accounts, and super admin accounts are never deleted here.
//! 3) Validate the payload and write through the identity store.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{
    auth::{
        principal,
        register::{create_identity, validate, EMAIL_TAKEN, USERNAME_TAKEN},
        AuthState,
    },
    parse_id,
};
use crate::{
    api::error::ApiError,
    auth::{
        guard::{
            ensure_can_create, ensure_can_delete, ensure_can_edit, ADMIN_ROLES, SUPER_ADMIN_ONLY,
        },
        identity::IdentityChanges,
        store::UpdateOutcome,
        validation::{normalize_email, normalize_username, FieldErrors},
        Identity, Role,
    },
};

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: Option<String>,
    pub password: String,
    /// Defaults to `USER`.
    pub role: Option<String>,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: Option<String>,
}

fn parse_role(raw: Option<&str>) -> Result<Option<Role>, ApiError> {
    raw.map(|value| {
        value.parse::<Role>().map_err(|_| {
            let mut errors = FieldErrors::new();
            errors.add("role", "Role must be USER, ADMIN or SUPER_ADMIN");
            ApiError::Validation(errors)
        })
    })
    .transpose()
}

#[utoipa::path(
    get,
    path = "/v1/users",
    responses(
        (status = 200, description = "Regular user accounts", body = [Identity]),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Forbidden"),
    ),
    tag = "users"
)]
pub async fn list_users(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    principal::require(&headers, &auth_state, ADMIN_ROLES)?;
    Ok(Json(auth_state.store().list(&[Role::User]).await?))
}

#[utoipa::path(
    get,
    path = "/v1/admins",
    responses(
        (status = 200, description = "Admin and super admin accounts", body = [Identity]),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Forbidden"),
    ),
    tag = "users"
)]
pub async fn list_admins(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    principal::require(&headers, &auth_state, SUPER_ADMIN_ONLY)?;
    Ok(Json(
        auth_state
            .store()
            .list(&[Role::Admin, Role::SuperAdmin])
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = Identity),
        (status = 400, description = "Validation failed or email/username taken"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Role may not be granted by the caller"),
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn create_user(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateUserRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = principal::require(&headers, &auth_state, ADMIN_ROLES)?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Missing payload"));
    };
    let role = parse_role(request.role.as_deref())?.unwrap_or(Role::User);
    ensure_can_create(&claims, role)?;

    let registration = validate(
        &request.email,
        request.username.as_deref(),
        request.password,
    )?;
    let identity = create_identity(&auth_state, registration, role).await?;

    info!(subject = %identity.id, role = %role, actor = %claims.subject_id, "Account created");
    Ok((StatusCode::CREATED, Json(identity)))
}

#[utoipa::path(
    patch,
    path = "/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = Identity),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn patch_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<UpdateUserRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = principal::require(&headers, &auth_state, ADMIN_ROLES)?;
    let id = parse_id(&id)?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Missing payload"));
    };
    let requested_role = parse_role(request.role.as_deref())?;

    let Some(target) = auth_state.store().find_by_id(id).await? else {
        return Err(ApiError::NotFound("User not found"));
    };
    ensure_can_edit(&claims, target.role, requested_role)?;

    let mut errors = FieldErrors::new();
    let email = request
        .email
        .as_deref()
        .and_then(|email| errors.check("email", normalize_email(email)));
    let username = errors
        .check("username", normalize_username(request.username.as_deref()))
        .flatten();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let changes = IdentityChanges {
        email,
        username,
        role: requested_role,
    };
    if changes.is_empty() {
        return Err(ApiError::BadRequest("No updates provided"));
    }

    match auth_state.store().update(id, changes).await? {
        UpdateOutcome::Updated(identity) => {
            info!(subject = %identity.id, actor = %claims.subject_id, "Account updated");
            Ok(Json(identity))
        }
        UpdateOutcome::NotFound => Err(ApiError::NotFound("User not found")),
        UpdateOutcome::EmailTaken => Err(ApiError::Conflict(EMAIL_TAKEN)),
        UpdateOutcome::UsernameTaken => Err(ApiError::Conflict(USERNAME_TAKEN)),
    }
}

#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 400, description = "Invalid user id"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Account is protected or outranks the caller"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn delete_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = principal::require(&headers, &auth_state, ADMIN_ROLES)?;
    let id = parse_id(&id)?;

    let Some(target) = auth_state.store().find_by_id(id).await? else {
        return Err(ApiError::NotFound("User not found"));
    };
    ensure_can_delete(&claims, target.role)?;

    if !auth_state.store().delete(id).await? {
        return Err(ApiError::NotFound("User not found"));
    }
    info!(subject = %id, actor = %claims.subject_id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}
