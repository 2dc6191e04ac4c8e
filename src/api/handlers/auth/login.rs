//! Password login.
//!
//! Flow Overview: verify the identifier and password, snapshot the identity
//! into session claims, then return the token both as an `HttpOnly` cookie and
//! in the body for bearer clients. Every credential rejection renders the same
//! 401 body; the specific kind only goes to the logs.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::{session::session_cookie, state::AuthState};
use crate::{
    api::error::ApiError,
    auth::{landing::default_landing_path, AuthFailure, Identity, SessionClaims},
};

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address or username.
    pub identifier: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: Identity,
    pub access_token: String,
    pub expires_in: u64,
    pub landing_path: String,
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        warn!(kind = AuthFailure::MissingCredentials.kind(), "Login rejected");
        return Err(ApiError::InvalidCredentials);
    };

    let identity = match auth_state
        .verifier()
        .verify(&request.identifier, &request.password)
        .await
    {
        Ok(identity) => identity,
        Err(failure) => {
            if failure.is_credential_failure() {
                warn!(kind = failure.kind(), "Login rejected");
            }
            return Err(failure.into());
        }
    };

    let claims = SessionClaims::issue(&identity);
    let token = auth_state.keys().sign(&claims)?;

    let mut headers = HeaderMap::new();
    let cookie = session_cookie(&auth_state, &token)
        .map_err(|err| ApiError::Internal(err.into()))?;
    headers.insert(SET_COOKIE, cookie);

    info!(subject = %identity.id, role = %identity.role, "Session issued");

    let response = LoginResponse {
        landing_path: default_landing_path(Some(identity.role)).to_string(),
        user: identity,
        access_token: token,
        expires_in: auth_state.keys().ttl_seconds(),
    };
    Ok((StatusCode::OK, headers, Json(response)))
}
