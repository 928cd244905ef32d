// ABOUTME: Single-use state and nonce storage with atomic check-and-delete consumption
// ABOUTME: Defines the ReplayStore seam plus a dashmap-backed in-process implementation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::errors::DatabaseError;
use crate::models::{LoginState, NonceRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Storage for anti-replay tokens minted at login and consumed at launch
///
/// `consume_*` must check liveness and delete in one atomic step: of any number
/// of concurrent callers presenting the same token, at most one receives it.
#[async_trait]
pub trait ReplayStore: Send + Sync {
    /// Persist a freshly minted login state
    async fn store_login_state(&self, state: &LoginState) -> Result<(), DatabaseError>;

    /// Persist a freshly minted nonce
    async fn store_nonce(&self, nonce: &NonceRecord) -> Result<(), DatabaseError>;

    /// Remove and return the login state if it exists and `now < expires_at`
    async fn consume_login_state(
        &self,
        state: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<LoginState>, DatabaseError>;

    /// Remove and return the nonce record if it exists and `now < expires_at`
    async fn consume_nonce(
        &self,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<NonceRecord>, DatabaseError>;

    /// Delete every expired state and nonce, returning how many were removed
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError>;
}

/// Process-local replay store
///
/// Suitable for a single server instance and for tests. Consumption runs
/// under the owning shard's write lock via [`DashMap::remove_if`].
#[derive(Debug, Default)]
pub struct InMemoryReplayStore {
    states: DashMap<String, LoginState>,
    nonces: DashMap<String, NonceRecord>,
}

impl InMemoryReplayStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live and expired login states currently held
    #[must_use]
    pub fn login_state_count(&self) -> usize {
        self.states.len()
    }

    /// Live and expired nonces currently held
    #[must_use]
    pub fn nonce_count(&self) -> usize {
        self.nonces.len()
    }
}

#[async_trait]
impl ReplayStore for InMemoryReplayStore {
    async fn store_login_state(&self, state: &LoginState) -> Result<(), DatabaseError> {
        self.states.insert(state.state.clone(), state.clone());
        Ok(())
    }

    async fn store_nonce(&self, nonce: &NonceRecord) -> Result<(), DatabaseError> {
        self.nonces.insert(nonce.nonce.clone(), nonce.clone());
        Ok(())
    }

    async fn consume_login_state(
        &self,
        state: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<LoginState>, DatabaseError> {
        if let Some((_, record)) = self.states.remove_if(state, |_, s| s.is_live(now)) {
            return Ok(Some(record));
        }
        // expired entries are dropped on sight
        self.states.remove_if(state, |_, s| !s.is_live(now));
        Ok(None)
    }

    async fn consume_nonce(
        &self,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<NonceRecord>, DatabaseError> {
        if let Some((_, record)) = self.nonces.remove_if(nonce, |_, n| n.is_live(now)) {
            return Ok(Some(record));
        }
        self.nonces.remove_if(nonce, |_, n| !n.is_live(now));
        Ok(None)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let before = self.states.len() + self.nonces.len();
        self.states.retain(|_, s| s.is_live(now));
        self.nonces.retain(|_, n| n.is_live(now));
        let after = self.states.len() + self.nonces.len();
        Ok(before.saturating_sub(after) as u64)
    }
}
