// ABOUTME: Session persistence keyed by the SHA-256 hash of the cookie token
// ABOUTME: Lookups ignore expired rows; expired rows are purged opportunistically
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{timestamp_from_db, uuid_from_db, Database};
use crate::errors::DatabaseError;
use crate::models::{Role, SessionIdentity};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

impl Database {
    /// Create the sessions table
    pub(super) async fn migrate_sessions(&self) -> Result<(), DatabaseError> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS sessions (
                token_hash TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
                role TEXT NOT NULL CHECK (role IN ('instructor', 'student')),
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )
            ",
        )
        .await?;
        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at)",
        )
        .await
    }

    /// Resolve a live session by token hash
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt
    pub async fn find_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionIdentity>, DatabaseError> {
        let row = sqlx::query(
            r"
            SELECT user_id, course_id, role, expires_at
            FROM sessions WHERE token_hash = $1 AND expires_at > $2
            ",
        )
        .bind(token_hash)
        .bind(now.timestamp())
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user_id: String = row.try_get("user_id")?;
        let course_id: String = row.try_get("course_id")?;
        let role: String = row.try_get("role")?;
        Ok(Some(SessionIdentity {
            user_id: uuid_from_db("sessions", &user_id)?,
            course_id: uuid_from_db("sessions", &course_id)?,
            role: Role::from_db(&role).ok_or_else(|| DatabaseError::InvalidRecord {
                table: "sessions",
                reason: format!("unknown role {role}"),
            })?,
            expires_at: timestamp_from_db("sessions", row.try_get("expires_at")?)?,
        }))
    }

    /// Delete a session, returning whether it existed
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails
    pub async fn delete_session(&self, token_hash: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every expired session
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails
    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now.timestamp())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

pub(super) async fn insert_session_on(
    conn: &mut SqliteConnection,
    token_hash: &str,
    user_id: Uuid,
    course_id: Uuid,
    role: Role,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r"
        INSERT INTO sessions (token_hash, user_id, course_id, role, created_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(token_hash)
    .bind(user_id.to_string())
    .bind(course_id.to_string())
    .bind(role.as_str())
    .bind(created_at.timestamp())
    .bind(expires_at.timestamp())
    .execute(&mut *conn)
    .await?;
    Ok(())
}
