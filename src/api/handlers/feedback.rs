//! Feedback exchanged between users and administrators.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    auth::{principal, AuthState},
    parse_id, write_error,
};
use crate::{
    api::error::ApiError,
    auth::guard::{ensure_owner, ADMIN_ROLES, ANY_ROLE},
};

const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Serialize, ToSchema)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub reply: Option<String>,
    pub replied_by: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedbackRequest {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyRequest {
    pub reply: String,
}

const FEEDBACK_COLUMNS: &str = "id, user_id, message, reply, replied_by";

fn feedback_from_row(row: &PgRow) -> Result<Feedback, sqlx::Error> {
    Ok(Feedback {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        message: row.try_get("message")?,
        reply: row.try_get("reply")?,
        replied_by: row.try_get("replied_by")?,
    })
}

fn non_blank(value: &str, field: &'static str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(field));
    }
    if trimmed.chars().count() > MAX_MESSAGE_LEN {
        return Err(ApiError::BadRequest("Message is too long"));
    }
    Ok(trimmed.to_string())
}

async fn fetch_feedback(pool: &PgPool, user_id: Option<Uuid>) -> Result<Vec<Feedback>, ApiError> {
    let query = format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE ($1::uuid IS NULL OR user_id = $1) ORDER BY created_at DESC"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .bind(user_id)
        .fetch_all(pool)
        .instrument(span)
        .await?;
    Ok(rows
        .iter()
        .map(feedback_from_row)
        .collect::<Result<Vec<_>, _>>()?)
}

#[utoipa::path(
    post,
    path = "/v1/users/{id}/feedback",
    params(("id" = String, Path, description = "User id")),
    request_body = FeedbackRequest,
    responses(
        (status = 201, description = "Feedback submitted", body = Feedback),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
    ),
    tag = "feedback"
)]
pub async fn submit_feedback(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Option<Json<FeedbackRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = principal::require(&headers, &auth_state, ANY_ROLE)?;
    ensure_owner(&claims, &id.trim().to_ascii_lowercase())?;
    let user_id = parse_id(&id)?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Missing payload"));
    };
    let message = non_blank(&request.message, "Message is required")?;

    let query = format!(
        "INSERT INTO feedback (user_id, message) VALUES ($1, $2) RETURNING {FEEDBACK_COLUMNS}"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(user_id)
        .bind(&message)
        .fetch_one(&*pool)
        .instrument(span)
        .await
        .map_err(write_error)?;
    let feedback = feedback_from_row(&row)?;

    info!(feedback = %feedback.id, "Feedback submitted");
    Ok((StatusCode::CREATED, Json(feedback)))
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}/feedback",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Feedback of the user", body = [Feedback]),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the owner"),
    ),
    tag = "feedback"
)]
pub async fn list_own_feedback(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = principal::require(&headers, &auth_state, ANY_ROLE)?;
    ensure_owner(&claims, &id.trim().to_ascii_lowercase())?;
    let user_id = parse_id(&id)?;
    Ok(Json(fetch_feedback(&pool, Some(user_id)).await?))
}

#[utoipa::path(
    get,
    path = "/v1/feedback",
    responses(
        (status = 200, description = "All feedback", body = [Feedback]),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Forbidden"),
    ),
    tag = "feedback"
)]
pub async fn list_feedback(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    principal::require(&headers, &auth_state, ADMIN_ROLES)?;
    Ok(Json(fetch_feedback(&pool, None).await?))
}

#[utoipa::path(
    post,
    path = "/v1/feedback/{id}/reply",
    params(("id" = String, Path, description = "Feedback id")),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Reply stored", body = Feedback),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Feedback not found"),
    ),
    tag = "feedback"
)]
pub async fn reply_feedback(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Option<Json<ReplyRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = principal::require(&headers, &auth_state, ADMIN_ROLES)?;
    let id = parse_id(&id)?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Missing payload"));
    };
    let reply = non_blank(&request.reply, "Reply is required")?;
    let replied_by = parse_id(&claims.subject_id)?;

    let query = format!(
        "UPDATE feedback SET reply = $1, replied_by = $2, replied_at = NOW() WHERE id = $3 RETURNING {FEEDBACK_COLUMNS}"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(&reply)
        .bind(replied_by)
        .bind(id)
        .fetch_optional(&*pool)
        .instrument(span)
        .await
        .map_err(write_error)?;

    match row {
        Some(row) => {
            info!(feedback = %id, actor = %claims.subject_id, "Feedback replied");
            Ok(Json(feedback_from_row(&row)?))
        }
        None => Err(ApiError::NotFound("Feedback not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_trims_and_bounds() {
        assert!(matches!(
            non_blank("  ", "Message is required"),
            Err(ApiError::BadRequest("Message is required"))
        ));
        assert_eq!(
            non_blank(" thanks ", "Message is required").ok().as_deref(),
            Some("thanks")
        );
        let long = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert!(non_blank(&long, "Message is required").is_err());
    }
}
