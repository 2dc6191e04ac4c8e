//! Question bank endpoints.
//!
//! Any authenticated identity may browse; only the admin tier may mutate.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::{str::FromStr, sync::Arc};
use tracing::{info, info_span, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    auth::{principal, AuthState},
    normalize_optional, parse_id,
};
use crate::{
    api::error::ApiError,
    auth::{
        guard::{ADMIN_ROLES, ANY_ROLE},
        validation::FieldErrors,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "EASY",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
        }
    }
}

impl FromStr for Difficulty {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(Self::Easy),
            "MEDIUM" => Ok(Self::Medium),
            "HARD" => Ok(Self::Hard),
            _ => Err("Difficulty must be EASY, MEDIUM or HARD"),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Question {
    pub id: Uuid,
    pub title: String,
    pub url: Option<String>,
    pub difficulty: Difficulty,
    pub topic: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuestionRequest {
    pub title: String,
    pub url: Option<String>,
    pub difficulty: String,
    pub topic: Option<String>,
}

struct QuestionFields {
    title: String,
    url: Option<String>,
    difficulty: Difficulty,
    topic: Option<String>,
}

fn validate(request: QuestionRequest) -> Result<QuestionFields, FieldErrors> {
    let mut errors = FieldErrors::new();
    let title = request.title.trim().to_string();
    if title.is_empty() {
        errors.add("title", "Title is required");
    }
    let difficulty = errors.check("difficulty", request.difficulty.parse::<Difficulty>());
    match difficulty {
        Some(difficulty) if errors.is_empty() => Ok(QuestionFields {
            title,
            url: normalize_optional(request.url),
            difficulty,
            topic: normalize_optional(request.topic),
        }),
        _ => Err(errors),
    }
}

fn question_from_row(row: &PgRow) -> Result<Question, ApiError> {
    let difficulty: String = row.try_get("difficulty")?;
    Ok(Question {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        url: row.try_get("url")?,
        difficulty: difficulty
            .parse()
            .map_err(|err: &str| ApiError::Internal(anyhow::anyhow!(err)))?,
        topic: row.try_get("topic")?,
    })
}

#[utoipa::path(
    get,
    path = "/v1/questions",
    responses(
        (status = 200, description = "Question bank", body = [Question]),
        (status = 401, description = "Authentication required"),
    ),
    tag = "questions"
)]
pub async fn list_questions(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    principal::require(&headers, &auth_state, ANY_ROLE)?;

    let query = r"
        SELECT id, title, url, difficulty, topic
        FROM questions
        ORDER BY created_at
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .fetch_all(&*pool)
        .instrument(span)
        .await?;
    let questions = rows
        .iter()
        .map(question_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(questions))
}

#[utoipa::path(
    post,
    path = "/v1/questions",
    request_body = QuestionRequest,
    responses(
        (status = 201, description = "Question created", body = Question),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Forbidden"),
    ),
    tag = "questions"
)]
pub async fn create_question(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Option<Json<QuestionRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = principal::require(&headers, &auth_state, ADMIN_ROLES)?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Missing payload"));
    };
    let fields = validate(request)?;

    let query = r"
        INSERT INTO questions (title, url, difficulty, topic)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, url, difficulty, topic
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(&fields.title)
        .bind(fields.url.as_deref())
        .bind(fields.difficulty.as_str())
        .bind(fields.topic.as_deref())
        .fetch_one(&*pool)
        .instrument(span)
        .await?;
    let question = question_from_row(&row)?;

    info!(question = %question.id, actor = %claims.subject_id, "Question created");
    Ok((StatusCode::CREATED, Json(question)))
}

#[utoipa::path(
    put,
    path = "/v1/questions/{id}",
    params(("id" = String, Path, description = "Question id")),
    request_body = QuestionRequest,
    responses(
        (status = 200, description = "Question updated", body = Question),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Question not found"),
    ),
    tag = "questions"
)]
pub async fn update_question(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Option<Json<QuestionRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    principal::require(&headers, &auth_state, ADMIN_ROLES)?;
    let id = parse_id(&id)?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Missing payload"));
    };
    let fields = validate(request)?;

    let query = r"
        UPDATE questions
        SET title = $1, url = $2, difficulty = $3, topic = $4, updated_at = NOW()
        WHERE id = $5
        RETURNING id, title, url, difficulty, topic
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(&fields.title)
        .bind(fields.url.as_deref())
        .bind(fields.difficulty.as_str())
        .bind(fields.topic.as_deref())
        .bind(id)
        .fetch_optional(&*pool)
        .instrument(span)
        .await?;

    match row {
        Some(row) => Ok(Json(question_from_row(&row)?)),
        None => Err(ApiError::NotFound("Question not found")),
    }
}

#[utoipa::path(
    delete,
    path = "/v1/questions/{id}",
    params(("id" = String, Path, description = "Question id")),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Question not found"),
    ),
    tag = "questions"
)]
pub async fn delete_question(
    Path(id): Path<String>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = principal::require(&headers, &auth_state, ADMIN_ROLES)?;
    let id = parse_id(&id)?;

    let query = "DELETE FROM questions WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .execute(&*pool)
        .instrument(span)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Question not found"));
    }
    info!(question = %id, actor = %claims.subject_id, "Question deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, difficulty: &str) -> QuestionRequest {
        QuestionRequest {
            title: title.to_string(),
            url: Some("  ".to_string()),
            difficulty: difficulty.to_string(),
            topic: Some(" Arrays ".to_string()),
        }
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!(" Hard ".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn validate_normalizes_optional_fields() {
        let fields = validate(request(" Two Sum ", "medium"));
        assert!(fields.is_ok());
        if let Ok(fields) = fields {
            assert_eq!(fields.title, "Two Sum");
            assert_eq!(fields.url, None);
            assert_eq!(fields.topic.as_deref(), Some("Arrays"));
            assert_eq!(fields.difficulty, Difficulty::Medium);
        }
    }

    #[test]
    fn validate_reports_every_field() {
        let errors = validate(request(" ", "extreme")).err().unwrap_or_default();
        assert!(errors.get("title").is_some());
        assert!(errors.get("difficulty").is_some());
    }
}
