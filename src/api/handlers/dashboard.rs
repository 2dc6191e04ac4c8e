//! Dashboard entry points. Visits outside the caller's own area are
//! redirected rather than refused.

use axum::{
    extract::{Extension, OriginalUri},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::auth::{principal, AuthState};
use crate::auth::landing::dashboard_redirect;

pub async fn dashboard(
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let role = principal::read(&headers, &auth_state).map(|claims| claims.role);
    match dashboard_redirect(role, uri.path()) {
        Some(target) => {
            debug!(requested = uri.path(), target, "Redirecting dashboard visit");
            Redirect::to(target).into_response()
        }
        None => (
            StatusCode::OK,
            Json(json!({ "area": uri.path(), "role": role })),
        )
            .into_response(),
    }
}
