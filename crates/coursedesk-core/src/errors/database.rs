// ABOUTME: Structured error types for database operations
// ABOUTME: Provides domain-specific errors with context and sqlx conversion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use thiserror::Error;

/// Database operation failures
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Could not open or reach the database
    #[error("database connection failed: {context}")]
    ConnectionError {
        /// Underlying driver message
        context: String,
    },

    /// A statement failed to execute
    #[error("database query failed: {context}")]
    QueryError {
        /// Underlying driver message
        context: String,
    },

    /// Schema creation failed
    #[error("database migration failed: {context}")]
    MigrationError {
        /// Underlying driver message
        context: String,
    },

    /// A stored row could not be mapped back into a domain type
    #[error("invalid record in {table}: {reason}")]
    InvalidRecord {
        /// Table the row came from
        table: &'static str,
        /// What was wrong with it
        reason: String,
    },
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        Self::QueryError {
            context: error.to_string(),
        }
    }
}
