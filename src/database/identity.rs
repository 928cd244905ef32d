// ABOUTME: User, course and enrollment upserts keyed by platform identifiers
// ABOUTME: Also implements LaunchStore: the upserts and session insert commit in one transaction
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{timestamp_from_db, uuid_from_db, Database};
use crate::errors::DatabaseError;
use crate::lti::{LaunchIds, LaunchRecord, LaunchStore};
use crate::models::{
    CourseContext, CourseRecord, EnrollmentRecord, Role, UserProfile, UserRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

impl Database {
    /// Create the users, courses and enrollments tables
    pub(super) async fn migrate_identity(&self) -> Result<(), DatabaseError> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                issuer TEXT NOT NULL,
                subject TEXT NOT NULL,
                name TEXT,
                email TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (issuer, subject)
            )
            ",
        )
        .await?;

        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS courses (
                id TEXT PRIMARY KEY,
                issuer TEXT NOT NULL,
                context_id TEXT NOT NULL,
                title TEXT,
                label TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (issuer, context_id)
            )
            ",
        )
        .await?;

        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS enrollments (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
                role TEXT NOT NULL CHECK (role IN ('instructor', 'student')),
                last_seen_at INTEGER NOT NULL,
                PRIMARY KEY (user_id, course_id)
            )
            ",
        )
        .await?;

        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_enrollments_course_id ON enrollments(course_id)",
        )
        .await
    }

    /// Insert or refresh a user by `(issuer, subject)`
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails
    pub async fn upsert_user(
        &self,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> Result<Uuid, DatabaseError> {
        let mut conn = self.pool().acquire().await?;
        upsert_user_on(&mut conn, profile, now).await
    }

    /// Insert or refresh a course by `(issuer, context_id)`
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails
    pub async fn upsert_course(
        &self,
        course: &CourseContext,
        now: DateTime<Utc>,
    ) -> Result<Uuid, DatabaseError> {
        let mut conn = self.pool().acquire().await?;
        upsert_course_on(&mut conn, course, now).await
    }

    /// Insert or refresh an enrollment
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails, including unknown user or course ids
    pub async fn upsert_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let mut conn = self.pool().acquire().await?;
        upsert_enrollment_on(&mut conn, user_id, course_id, role, now).await
    }

    /// Look up a user by platform identity
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt
    pub async fn get_user_by_subject(
        &self,
        issuer: &str,
        subject: &str,
    ) -> Result<Option<UserRecord>, DatabaseError> {
        let row = sqlx::query(
            r"
            SELECT id, issuer, subject, name, email, created_at, updated_at
            FROM users WHERE issuer = $1 AND subject = $2
            ",
        )
        .bind(issuer)
        .bind(subject)
        .fetch_optional(self.pool())
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// Look up a course by platform context
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt
    pub async fn get_course_by_context(
        &self,
        issuer: &str,
        context_id: &str,
    ) -> Result<Option<CourseRecord>, DatabaseError> {
        let row = sqlx::query(
            r"
            SELECT id, issuer, context_id, title, label, created_at, updated_at
            FROM courses WHERE issuer = $1 AND context_id = $2
            ",
        )
        .bind(issuer)
        .bind(context_id)
        .fetch_optional(self.pool())
        .await?;
        row.as_ref().map(course_from_row).transpose()
    }

    /// Look up an enrollment
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt
    pub async fn get_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<EnrollmentRecord>, DatabaseError> {
        let row = sqlx::query(
            r"
            SELECT user_id, course_id, role, last_seen_at
            FROM enrollments WHERE user_id = $1 AND course_id = $2
            ",
        )
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .fetch_optional(self.pool())
        .await?;
        row.as_ref().map(enrollment_from_row).transpose()
    }

    /// Number of user rows
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_users(&self) -> Result<i64, DatabaseError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?)
    }

    /// Number of course rows
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_courses(&self) -> Result<i64, DatabaseError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(self.pool())
            .await?)
    }
}

fn returned_id(table: &'static str, row: &SqliteRow) -> Result<Uuid, DatabaseError> {
    let id: String = row.try_get("id")?;
    uuid_from_db(table, &id)
}

async fn upsert_user_on(
    conn: &mut SqliteConnection,
    profile: &UserProfile,
    now: DateTime<Utc>,
) -> Result<Uuid, DatabaseError> {
    // absent profile fields keep their stored values
    let row = sqlx::query(
        r"
        INSERT INTO users (id, issuer, subject, name, email, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        ON CONFLICT (issuer, subject) DO UPDATE SET
            name = COALESCE(excluded.name, users.name),
            email = COALESCE(excluded.email, users.email),
            updated_at = excluded.updated_at
        RETURNING id
        ",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&profile.issuer)
    .bind(&profile.subject)
    .bind(&profile.name)
    .bind(&profile.email)
    .bind(now.timestamp())
    .fetch_one(&mut *conn)
    .await?;
    returned_id("users", &row)
}

async fn upsert_course_on(
    conn: &mut SqliteConnection,
    course: &CourseContext,
    now: DateTime<Utc>,
) -> Result<Uuid, DatabaseError> {
    let row = sqlx::query(
        r"
        INSERT INTO courses (id, issuer, context_id, title, label, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        ON CONFLICT (issuer, context_id) DO UPDATE SET
            title = COALESCE(excluded.title, courses.title),
            label = COALESCE(excluded.label, courses.label),
            updated_at = excluded.updated_at
        RETURNING id
        ",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&course.issuer)
    .bind(&course.context_id)
    .bind(&course.title)
    .bind(&course.label)
    .bind(now.timestamp())
    .fetch_one(&mut *conn)
    .await?;
    returned_id("courses", &row)
}

async fn upsert_enrollment_on(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    course_id: Uuid,
    role: Role,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r"
        INSERT INTO enrollments (user_id, course_id, role, last_seen_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, course_id) DO UPDATE SET
            role = excluded.role,
            last_seen_at = excluded.last_seen_at
        ",
    )
    .bind(user_id.to_string())
    .bind(course_id.to_string())
    .bind(role.as_str())
    .bind(now.timestamp())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn user_from_row(row: &SqliteRow) -> Result<UserRecord, DatabaseError> {
    Ok(UserRecord {
        id: returned_id("users", row)?,
        issuer: row.try_get("issuer")?,
        subject: row.try_get("subject")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        created_at: timestamp_from_db("users", row.try_get("created_at")?)?,
        updated_at: timestamp_from_db("users", row.try_get("updated_at")?)?,
    })
}

fn course_from_row(row: &SqliteRow) -> Result<CourseRecord, DatabaseError> {
    Ok(CourseRecord {
        id: returned_id("courses", row)?,
        issuer: row.try_get("issuer")?,
        context_id: row.try_get("context_id")?,
        title: row.try_get("title")?,
        label: row.try_get("label")?,
        created_at: timestamp_from_db("courses", row.try_get("created_at")?)?,
        updated_at: timestamp_from_db("courses", row.try_get("updated_at")?)?,
    })
}

fn enrollment_from_row(row: &SqliteRow) -> Result<EnrollmentRecord, DatabaseError> {
    let user_id: String = row.try_get("user_id")?;
    let course_id: String = row.try_get("course_id")?;
    let role: String = row.try_get("role")?;
    Ok(EnrollmentRecord {
        user_id: uuid_from_db("enrollments", &user_id)?,
        course_id: uuid_from_db("enrollments", &course_id)?,
        role: Role::from_db(&role).ok_or_else(|| DatabaseError::InvalidRecord {
            table: "enrollments",
            reason: format!("unknown role {role}"),
        })?,
        last_seen_at: timestamp_from_db("enrollments", row.try_get("last_seen_at")?)?,
    })
}

#[async_trait]
impl LaunchStore for Database {
    async fn record_launch(&self, record: &LaunchRecord) -> Result<LaunchIds, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let user_id = upsert_user_on(&mut tx, &record.user, record.issued_at).await?;
        let course_id = upsert_course_on(&mut tx, &record.course, record.issued_at).await?;
        upsert_enrollment_on(&mut tx, user_id, course_id, record.role, record.issued_at).await?;
        super::sessions::insert_session_on(
            &mut tx,
            &record.session_token_hash,
            user_id,
            course_id,
            record.role,
            record.issued_at,
            record.session_expires_at,
        )
        .await?;

        tx.commit().await?;
        Ok(LaunchIds { user_id, course_id })
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        self.delete_expired_sessions(now).await
    }
}
