//! Aggregate counts for the super admin dashboard.

use axum::{extract::Extension, http::HeaderMap, response::IntoResponse, Json};
use serde::Serialize;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{info_span, Instrument};
use utoipa::ToSchema;

use super::auth::{principal, AuthState};
use crate::{api::error::ApiError, auth::guard::SUPER_ADMIN_ONLY};

/// Aggregate counters for the super admin dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStats {
    pub users: i64,
    pub admins: i64,
    pub super_admins: i64,
    pub questions: i64,
    pub solved: i64,
    pub feedback_open: i64,
    pub feedback_replied: i64,
}

#[utoipa::path(
    get,
    path = "/v1/admin/stats",
    responses(
        (status = 200, description = "Aggregate counts", body = AdminStats),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Forbidden"),
    ),
    tag = "admin"
)]
pub async fn admin_stats(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    principal::require(&headers, &auth_state, SUPER_ADMIN_ONLY)?;

    let query = r"
        SELECT
            (SELECT COUNT(*) FROM users WHERE role = 'USER') AS users,
            (SELECT COUNT(*) FROM users WHERE role = 'ADMIN') AS admins,
            (SELECT COUNT(*) FROM users WHERE role = 'SUPER_ADMIN') AS super_admins,
            (SELECT COUNT(*) FROM questions) AS questions,
            (SELECT COUNT(*) FROM user_progress WHERE solved) AS solved,
            (SELECT COUNT(*) FROM feedback WHERE reply IS NULL) AS feedback_open,
            (SELECT COUNT(*) FROM feedback WHERE reply IS NOT NULL) AS feedback_replied
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .fetch_one(&*pool)
        .instrument(span)
        .await?;

    Ok(Json(AdminStats {
        users: row.try_get("users")?,
        admins: row.try_get("admins")?,
        super_admins: row.try_get("super_admins")?,
        questions: row.try_get("questions")?,
        solved: row.try_get("solved")?,
        feedback_open: row.try_get("feedback_open")?,
        feedback_replied: row.try_get("feedback_replied")?,
    }))
}
