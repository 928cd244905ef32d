// ABOUTME: Launch orchestration: the ordered verification gates from state consumption to session issuance
// ABOUTME: Nothing durable is written until every gate has passed; the state is burnt by the first gate regardless
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::claims::{ClaimValidator, LaunchClaims};
use super::jwks::select_key;
use super::jwt::parse_token;
use super::login::required;
use super::roles::derive_role;
use super::service::LtiService;
use crate::crypto::{constant_time_eq, generate_token, hash_token, RsaPublicKeyPem};
use crate::errors::{DatabaseError, LtiError};
use crate::models::{CourseContext, LoginState, Role, Session, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;

/// Form fields posted by the platform to the launch endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaunchForm {
    /// Signed platform token
    pub id_token: Option<String>,
    /// State minted at login
    pub state: Option<String>,
}

/// Everything persisted for a verified launch
#[derive(Debug, Clone)]
pub struct LaunchRecord {
    /// User to upsert
    pub user: UserProfile,
    /// Course to upsert
    pub course: CourseContext,
    /// Enrollment role
    pub role: Role,
    /// SHA-256 of the new session id
    pub session_token_hash: String,
    /// Launch time
    pub issued_at: DateTime<Utc>,
    /// Session expiry
    pub session_expires_at: DateTime<Utc>,
}

/// Row ids produced by [`LaunchStore::record_launch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchIds {
    /// User row id
    pub user_id: Uuid,
    /// Course row id
    pub course_id: Uuid,
}

/// Persistence for verified launches
#[async_trait]
pub trait LaunchStore: Send + Sync {
    /// Upsert user, course and enrollment and insert the session, all or nothing
    async fn record_launch(&self, record: &LaunchRecord) -> Result<LaunchIds, DatabaseError>;

    /// Delete sessions past their expiry
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError>;
}

/// Result of a successful launch
#[derive(Debug, Clone)]
pub struct LaunchSuccess {
    /// Newly issued session, including the raw cookie token
    pub session: Session,
    /// Where to send the browser
    pub redirect_to: Url,
}

impl LtiService {
    /// Verify a launch at the current time
    ///
    /// # Errors
    ///
    /// See [`LtiService::launch_at`]
    pub async fn launch(&self, form: &LaunchForm) -> Result<LaunchSuccess, LtiError> {
        self.launch_at(form, Utc::now()).await
    }

    /// Verify a launch and issue a session
    ///
    /// Failures are logged here with full detail.
    ///
    /// # Errors
    ///
    /// Returns the error of the first gate that fails
    pub async fn launch_at(
        &self,
        form: &LaunchForm,
        now: DateTime<Utc>,
    ) -> Result<LaunchSuccess, LtiError> {
        let result = self.run_launch(form, now).await;
        if let Err(e) = &result {
            if matches!(e, LtiError::Storage(_)) {
                error!(error_kind = e.kind(), error = %e, "LTI launch failed");
            } else {
                warn!(error_kind = e.kind(), error = %e, "LTI launch rejected");
            }
        }
        result
    }

    async fn run_launch(
        &self,
        form: &LaunchForm,
        now: DateTime<Utc>,
    ) -> Result<LaunchSuccess, LtiError> {
        let id_token = required(form.id_token.as_deref(), "id_token")?;
        let state = required(form.state.as_deref(), "state")?;

        // 1. state is single-use from here on
        let login_state = self
            .replay()
            .consume_login_state(state, now)
            .await?
            .ok_or(LtiError::StateInvalidOrReused)?;

        // 2. the trust entry chosen at login
        let platform = self
            .registry()
            .resolve(&login_state.issuer, Some(&login_state.client_id))?;

        // 3. structure before crypto
        let token = parse_token(id_token)?;

        // 4-6. key material
        let key_set = self.jwks().fetch(&platform.jwks_uri).await?;
        let jwk = select_key(&key_set, token.header.kid.as_deref())?;
        let public_key =
            RsaPublicKeyPem::try_from(jwk).map_err(|e| LtiError::KeyNotFound(e.to_string()))?;

        // 7. signature, then claims
        token.verify(&public_key.pem)?;
        let claims: LaunchClaims = token.claims()?;
        let validator = ClaimValidator {
            anchor_issuer: &login_state.issuer,
            client_id: &platform.client_id,
            clock_skew_secs: self.settings().clock_skew_secs,
        };
        validator.validate_standard(&claims, now.timestamp())?;
        self.consume_nonce(&claims, &login_state, now).await?;
        validator.validate_lti(&claims)?;

        // 8-10. identity and session
        let role = derive_role(&claims.roles);
        let session_token = generate_token();
        let session_expires_at = now + self.settings().session_ttl;
        let record = LaunchRecord {
            user: claims.user_profile(),
            course: claims.course_context()?,
            role,
            session_token_hash: hash_token(&session_token),
            issued_at: now,
            session_expires_at,
        };
        let ids = self.launch_store().record_launch(&record).await?;

        info!(
            issuer = %login_state.issuer,
            user_id = %ids.user_id,
            course_id = %ids.course_id,
            role = %role,
            "LTI launch verified, session issued"
        );

        Ok(LaunchSuccess {
            session: Session {
                token: session_token,
                user_id: ids.user_id,
                course_id: ids.course_id,
                role,
                created_at: now,
                expires_at: session_expires_at,
            },
            redirect_to: self
                .settings()
                .redirect_target(login_state.target_link_uri.as_deref()),
        })
    }

    /// Match the token nonce against the login and burn its record
    async fn consume_nonce(
        &self,
        claims: &LaunchClaims,
        login_state: &LoginState,
        now: DateTime<Utc>,
    ) -> Result<(), LtiError> {
        let presented = claims
            .nonce
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or(LtiError::NonceInvalidOrReused)?;
        if !constant_time_eq(presented, &login_state.nonce) {
            return Err(LtiError::NonceInvalidOrReused);
        }
        let record = self
            .replay()
            .consume_nonce(presented, now)
            .await?
            .ok_or(LtiError::NonceInvalidOrReused)?;
        if record.issuer != login_state.issuer {
            return Err(LtiError::NonceInvalidOrReused);
        }
        Ok(())
    }
}
