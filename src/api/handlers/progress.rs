//! Per-user progress: solved flags, favorites and personal remarks.
//!
//! Progress is self-service. Any role may call these routes but only for its
//! own user id; admins do not get to read other users' notes.

use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::sync::Arc;
use tracing::{info_span, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    auth::{principal, AuthState},
    normalize_optional, parse_id, write_error,
};
use crate::{
    api::error::ApiError,
    auth::guard::{ensure_owner, ANY_ROLE},
};

const MAX_REMARK_LEN: usize = 2000;

#[derive(Debug, Serialize, ToSchema)]
pub struct Progress {
    pub question_id: Uuid,
    pub solved: bool,
    pub favorite: bool,
    pub remark: Option<String>,
}

/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProgressUpdate {
    pub solved: Option<bool>,
    pub favorite: Option<bool>,
    pub remark: Option<String>,
}

fn progress_from_row(row: &PgRow) -> Result<Progress, sqlx::Error> {
    Ok(Progress {
        question_id: row.try_get("question_id")?,
        solved: row.try_get("solved")?,
        favorite: row.try_get("favorite")?,
        remark: row.try_get("remark")?,
    })
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}/progress",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Progress of the user", body = [Progress]),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
    ),
    tag = "progress"
)]
pub async fn list_progress(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = principal::require(&headers, &auth_state, ANY_ROLE)?;
    ensure_owner(&claims, &id.trim().to_ascii_lowercase())?;
    let user_id = parse_id(&id)?;

    let query = r"
        SELECT question_id, solved, favorite, remark
        FROM user_progress
        WHERE user_id = $1
        ORDER BY updated_at DESC
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(user_id)
        .fetch_all(&*pool)
        .instrument(span)
        .await?;
    let progress = rows
        .iter()
        .map(progress_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(progress))
}

#[utoipa::path(
    put,
    path = "/v1/users/{id}/progress/{question_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("question_id" = String, Path, description = "Question id")
    ),
    request_body = ProgressUpdate,
    responses(
        (status = 200, description = "Progress saved", body = Progress),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Question not found"),
    ),
    tag = "progress"
)]
pub async fn put_progress(
    Path((id, question_id)): Path<(String, String)>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Option<Json<ProgressUpdate>>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = principal::require(&headers, &auth_state, ANY_ROLE)?;
    ensure_owner(&claims, &id.trim().to_ascii_lowercase())?;
    let user_id = parse_id(&id)?;
    let question_id = parse_id(&question_id)?;
    let Some(Json(update)) = payload else {
        return Err(ApiError::BadRequest("Missing payload"));
    };
    // A blank remark clears the stored one; an omitted remark keeps it.
    let clear_remark = update
        .remark
        .as_deref()
        .is_some_and(|remark| remark.trim().is_empty());
    let remark = normalize_optional(update.remark);
    if remark
        .as_ref()
        .is_some_and(|remark| remark.chars().count() > MAX_REMARK_LEN)
    {
        return Err(ApiError::BadRequest("Remark is too long"));
    }

    // An upsert so the first interaction with a question creates the row.
    let query = r"
        INSERT INTO user_progress (user_id, question_id, solved, favorite, remark)
        SELECT $1, q.id, COALESCE($3, FALSE), COALESCE($4, FALSE), $5
        FROM questions q
        WHERE q.id = $2
        ON CONFLICT (user_id, question_id) DO UPDATE
        SET
            solved = COALESCE($3, user_progress.solved),
            favorite = COALESCE($4, user_progress.favorite),
            remark = CASE WHEN $6 THEN NULL ELSE COALESCE($5, user_progress.remark) END,
            updated_at = NOW()
        RETURNING question_id, solved, favorite, remark
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(question_id)
        .bind(update.solved)
        .bind(update.favorite)
        .bind(remark.as_deref())
        .bind(clear_remark)
        .fetch_optional(&*pool)
        .instrument(span)
        .await
        .map_err(write_error)?;

    match row {
        Some(row) => Ok(Json(progress_from_row(&row)?)),
        None => Err(ApiError::NotFound("Question not found")),
    }
}
