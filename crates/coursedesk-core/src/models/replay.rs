// ABOUTME: Single-use anti-replay records minted at login initiation
// ABOUTME: LoginState binds state to issuer and nonce; NonceRecord is consumed independently
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Login-initiation record keyed by the `state` token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginState {
    /// Random state token
    pub state: String,
    /// Random nonce minted alongside the state
    pub nonce: String,
    /// Issuer the login was initiated for; the anchor for the launch `iss` check
    pub issuer: String,
    /// `client_id` of the trust entry resolved at login
    pub client_id: String,
    /// Where the platform asked to land the user
    pub target_link_uri: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Expiry time
    pub expires_at: DateTime<Utc>,
}

impl LoginState {
    /// Create a record valid for `ttl` from `now`
    #[must_use]
    pub fn new(
        state: String,
        nonce: String,
        issuer: String,
        client_id: String,
        target_link_uri: Option<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            state,
            nonce,
            issuer,
            client_id,
            target_link_uri,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Valid iff `now < expires_at`
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Nonce record, consumed during claim validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRecord {
    /// Random nonce token
    pub nonce: String,
    /// Issuer the nonce was minted for
    pub issuer: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Expiry time
    pub expires_at: DateTime<Utc>,
}

impl NonceRecord {
    /// Create a record valid for `ttl` from `now`
    #[must_use]
    pub fn new(nonce: String, issuer: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            nonce,
            issuer,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Valid iff `now < expires_at`
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_state_expires_exactly_at_ttl() {
        let now = Utc::now();
        let state = LoginState::new(
            "s".to_owned(),
            "n".to_owned(),
            "https://lms.example.edu".to_owned(),
            "client".to_owned(),
            None,
            now,
            Duration::seconds(600),
        );

        assert!(state.is_live(now));
        assert!(state.is_live(now + Duration::seconds(599)));
        assert!(!state.is_live(now + Duration::seconds(600)));
    }

    #[test]
    fn test_nonce_record_expiry() {
        let now = Utc::now();
        let record = NonceRecord::new(
            "n".to_owned(),
            "https://lms.example.edu".to_owned(),
            now,
            Duration::seconds(10),
        );
        assert!(record.is_live(now + Duration::seconds(9)));
        assert!(!record.is_live(now + Duration::seconds(10)));
    }
}
