// ABOUTME: SQLite persistence for anti-replay tokens, users, courses, enrollments and sessions
// ABOUTME: Owns the connection pool and creates the schema in code at startup
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Database Management
//!
//! All timestamps are stored as unix seconds in `INTEGER` columns and ids as
//! hyphenated UUID text.

mod identity;
mod replay;
mod sessions;

use crate::errors::DatabaseError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Pool size for file-backed databases
const FILE_POOL_SIZE: u32 = 8;

/// Database manager
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("connections", &self.pool.size())
            .finish()
    }
}

/// Whether the URL names a private in-memory database
fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

impl Database {
    /// Connect and create the schema
    ///
    /// An in-memory database lives in a single connection that is never
    /// recycled, since every new connection would see an empty database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or the
    /// schema cannot be created
    pub async fn new(database_url: &str) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| DatabaseError::ConnectionError {
                context: format!("invalid database URL: {e}"),
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let in_memory = is_in_memory(database_url);
        let (options, pool_options) = if in_memory {
            let pool_options = SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
            (options, pool_options)
        } else {
            let pool_options = SqlitePoolOptions::new().max_connections(FILE_POOL_SIZE);
            (options.journal_mode(SqliteJournalMode::Wal), pool_options)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionError {
                context: e.to_string(),
            })?;

        let db = Self { pool };
        db.migrate().await?;
        info!(in_memory, "database ready");
        Ok(db)
    }

    /// Get a reference to the database pool
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Create all tables and indexes
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::MigrationError`] if any statement fails
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        self.migrate_replay().await?;
        self.migrate_identity().await?;
        self.migrate_sessions().await?;
        Ok(())
    }

    /// Run one schema statement
    async fn execute_schema(&self, statement: &str) -> Result<(), DatabaseError> {
        sqlx::query(statement)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::MigrationError {
                context: e.to_string(),
            })?;
        Ok(())
    }

    /// Round-trip a trivial query
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Convert stored unix seconds back into a timestamp
pub(crate) fn timestamp_from_db(
    table: &'static str,
    secs: i64,
) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| DatabaseError::InvalidRecord {
        table,
        reason: format!("timestamp {secs} out of range"),
    })
}

/// Parse a stored UUID
pub(crate) fn uuid_from_db(table: &'static str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|e| DatabaseError::InvalidRecord {
        table,
        reason: format!("invalid id {value}: {e}"),
    })
}
