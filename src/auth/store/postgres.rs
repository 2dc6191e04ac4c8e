//! Postgres-backed identity store (`users` table in `sql/schema.sql`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{CreateOutcome, IdentityStore, UpdateOutcome};
use crate::auth::{
    identity::{Identity, IdentityChanges, NewIdentity, StoredIdentity},
    role::Role,
};

const EMAIL_CONSTRAINT: &str = "users_email_key";
const USERNAME_CONSTRAINT: &str = "users_username_key";

#[derive(Clone, Debug)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_stored(
        &self,
        query: &'static str,
        value: &str,
    ) -> Result<Option<StoredIdentity>> {
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(value)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup identity")?;

        row.map(|row| -> Result<StoredIdentity> {
            Ok(StoredIdentity {
                identity: identity_from_row(&row)?,
                password_hash: row.try_get("password_hash")?,
            })
        })
        .transpose()
    }
}

fn identity_from_row(row: &PgRow) -> Result<Identity> {
    let role: String = row.try_get("role")?;
    Ok(Identity {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        role: role.parse::<Role>()?,
    })
}

/// True when `err` is a unique violation of `constraint`.
fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().is_some_and(|code| code.as_ref() == "23505")
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredIdentity>> {
        self.find_stored(
            "SELECT id, email, username, password_hash, role FROM users WHERE lower(email) = $1",
            email,
        )
        .await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<StoredIdentity>> {
        self.find_stored(
            "SELECT id, email, username, password_hash, role FROM users WHERE lower(username) = $1",
            username,
        )
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        let query = "SELECT id, email, username, role FROM users WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to fetch identity")?;
        row.as_ref().map(identity_from_row).transpose()
    }

    async fn list(&self, roles: &[Role]) -> Result<Vec<Identity>> {
        let query = r"
            SELECT id, email, username, role
            FROM users
            WHERE role = ANY($1)
            ORDER BY created_at DESC
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let roles: Vec<String> = roles.iter().map(ToString::to_string).collect();
        let rows = sqlx::query(query)
            .bind(roles)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to list identities")?;
        rows.iter().map(identity_from_row).collect()
    }

    async fn create(&self, new: NewIdentity) -> Result<CreateOutcome> {
        let query = r"
            INSERT INTO users (email, username, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, username, role
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(&new.email)
            .bind(new.username.as_deref())
            .bind(new.password_hash.as_deref())
            .bind(new.role.as_str())
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(row) => Ok(CreateOutcome::Created(identity_from_row(&row)?)),
            Err(err) if violates(&err, EMAIL_CONSTRAINT) => Ok(CreateOutcome::EmailTaken),
            Err(err) if violates(&err, USERNAME_CONSTRAINT) => Ok(CreateOutcome::UsernameTaken),
            Err(err) => Err(err).context("failed to insert identity"),
        }
    }

    async fn update(&self, id: Uuid, changes: IdentityChanges) -> Result<UpdateOutcome> {
        let query = r"
            UPDATE users
            SET
                email = COALESCE($1, email),
                username = COALESCE($2, username),
                role = COALESCE($3, role),
                updated_at = NOW()
            WHERE id = $4
            RETURNING id, email, username, role
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(changes.email.as_deref())
            .bind(changes.username.as_deref())
            .bind(changes.role.map(Role::as_str))
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(Some(row)) => Ok(UpdateOutcome::Updated(identity_from_row(&row)?)),
            Ok(None) => Ok(UpdateOutcome::NotFound),
            Err(err) if violates(&err, EMAIL_CONSTRAINT) => Ok(UpdateOutcome::EmailTaken),
            Err(err) if violates(&err, USERNAME_CONSTRAINT) => Ok(UpdateOutcome::UsernameTaken),
            Err(err) => Err(err).context("failed to update identity"),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let query = "DELETE FROM users WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete identity")?;
        Ok(result.rows_affected() > 0)
    }
}
