// ABOUTME: SQLite-backed ReplayStore with single-statement consume via DELETE ... RETURNING
// ABOUTME: Login states and nonces live in separate tables and are swept together
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{timestamp_from_db, Database};
use crate::errors::DatabaseError;
use crate::lti::ReplayStore;
use crate::models::{LoginState, NonceRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Database {
    /// Create the login state and nonce tables
    pub(super) async fn migrate_replay(&self) -> Result<(), DatabaseError> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS lti_login_states (
                state TEXT PRIMARY KEY,
                nonce TEXT NOT NULL,
                issuer TEXT NOT NULL,
                client_id TEXT NOT NULL,
                target_link_uri TEXT,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )
            ",
        )
        .await?;

        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS lti_nonces (
                nonce TEXT PRIMARY KEY,
                issuer TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )
            ",
        )
        .await?;

        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_lti_login_states_expires_at ON lti_login_states(expires_at)",
        )
        .await?;
        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_lti_nonces_expires_at ON lti_nonces(expires_at)",
        )
        .await
    }
}

fn login_state_from_row(row: &SqliteRow) -> Result<LoginState, DatabaseError> {
    Ok(LoginState {
        state: row.try_get("state")?,
        nonce: row.try_get("nonce")?,
        issuer: row.try_get("issuer")?,
        client_id: row.try_get("client_id")?,
        target_link_uri: row.try_get("target_link_uri")?,
        created_at: timestamp_from_db("lti_login_states", row.try_get("created_at")?)?,
        expires_at: timestamp_from_db("lti_login_states", row.try_get("expires_at")?)?,
    })
}

fn nonce_from_row(row: &SqliteRow) -> Result<NonceRecord, DatabaseError> {
    Ok(NonceRecord {
        nonce: row.try_get("nonce")?,
        issuer: row.try_get("issuer")?,
        created_at: timestamp_from_db("lti_nonces", row.try_get("created_at")?)?,
        expires_at: timestamp_from_db("lti_nonces", row.try_get("expires_at")?)?,
    })
}

#[async_trait]
impl ReplayStore for Database {
    async fn store_login_state(&self, state: &LoginState) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            INSERT INTO lti_login_states
                (state, nonce, issuer, client_id, target_link_uri, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&state.state)
        .bind(&state.nonce)
        .bind(&state.issuer)
        .bind(&state.client_id)
        .bind(&state.target_link_uri)
        .bind(state.created_at.timestamp())
        .bind(state.expires_at.timestamp())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn store_nonce(&self, nonce: &NonceRecord) -> Result<(), DatabaseError> {
        sqlx::query(
            r"
            INSERT INTO lti_nonces (nonce, issuer, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(&nonce.nonce)
        .bind(&nonce.issuer)
        .bind(nonce.created_at.timestamp())
        .bind(nonce.expires_at.timestamp())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn consume_login_state(
        &self,
        state: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<LoginState>, DatabaseError> {
        let row = sqlx::query(
            r"
            DELETE FROM lti_login_states
            WHERE state = $1 AND expires_at > $2
            RETURNING state, nonce, issuer, client_id, target_link_uri, created_at, expires_at
            ",
        )
        .bind(state)
        .bind(now.timestamp())
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(login_state_from_row).transpose()
    }

    async fn consume_nonce(
        &self,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<NonceRecord>, DatabaseError> {
        let row = sqlx::query(
            r"
            DELETE FROM lti_nonces
            WHERE nonce = $1 AND expires_at > $2
            RETURNING nonce, issuer, created_at, expires_at
            ",
        )
        .bind(nonce)
        .bind(now.timestamp())
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(nonce_from_row).transpose()
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let states = sqlx::query("DELETE FROM lti_login_states WHERE expires_at <= $1")
            .bind(now.timestamp())
            .execute(self.pool())
            .await?;
        let nonces = sqlx::query("DELETE FROM lti_nonces WHERE expires_at <= $1")
            .bind(now.timestamp())
            .execute(self.pool())
            .await?;
        Ok(states.rows_affected() + nonces.rows_affected())
    }
}
