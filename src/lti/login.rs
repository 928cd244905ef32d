// ABOUTME: Third-party login initiation: resolves the platform, mints state and nonce, builds the auth redirect
// ABOUTME: Every input here is attacker-influenced and resolution fails closed
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::service::LtiService;
use crate::constants::lti::auth_request;
use crate::crypto::generate_token;
use crate::errors::LtiError;
use crate::models::{LoginState, NonceRecord, PlatformConfig};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use url::Url;

/// Parameters of an OIDC third-party initiated login
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInitiationParams {
    /// Platform issuer
    pub iss: Option<String>,
    /// Opaque user hint, echoed back to the platform
    pub login_hint: Option<String>,
    /// Where the platform wants the user to land
    pub target_link_uri: Option<String>,
    /// Opaque message hint, echoed back when present
    pub lti_message_hint: Option<String>,
    /// Tool `client_id` as known to the platform
    pub client_id: Option<String>,
}

/// Treat absent and blank values alike
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Require a non-blank parameter
pub(crate) fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, LtiError> {
    present(value).ok_or(LtiError::MissingParameter(name))
}

/// Build the platform authentication request URL
#[must_use]
pub fn build_auth_request_url(
    platform: &PlatformConfig,
    redirect_uri: &Url,
    login_hint: &str,
    lti_message_hint: Option<&str>,
    state: &str,
    nonce: &str,
) -> Url {
    let mut url = platform.auth_endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("scope", auth_request::SCOPE)
            .append_pair("response_type", auth_request::RESPONSE_TYPE)
            .append_pair("client_id", &platform.client_id)
            .append_pair("redirect_uri", redirect_uri.as_str())
            .append_pair("login_hint", login_hint);
        if let Some(hint) = lti_message_hint {
            query.append_pair("lti_message_hint", hint);
        }
        query
            .append_pair("state", state)
            .append_pair("nonce", nonce)
            .append_pair("response_mode", auth_request::RESPONSE_MODE)
            .append_pair("prompt", auth_request::PROMPT);
    }
    url
}

impl LtiService {
    /// Start a login for the current time
    ///
    /// # Errors
    ///
    /// See [`LtiService::initiate_login_at`]
    pub async fn initiate_login(&self, params: &LoginInitiationParams) -> Result<Url, LtiError> {
        self.initiate_login_at(params, Utc::now()).await
    }

    /// Start a login: persist a fresh state and nonce and return the platform redirect
    ///
    /// Failures are logged here with full detail.
    ///
    /// # Errors
    ///
    /// Returns [`LtiError::MissingParameter`] without `iss` or `login_hint`,
    /// a registry error for unknown platforms, or a storage error
    pub async fn initiate_login_at(
        &self,
        params: &LoginInitiationParams,
        now: DateTime<Utc>,
    ) -> Result<Url, LtiError> {
        let result = self.run_login(params, now).await;
        if let Err(e) = &result {
            let issuer = params.iss.as_deref().unwrap_or_default();
            if matches!(e, LtiError::Storage(_)) {
                error!(error_kind = e.kind(), error = %e, issuer, "LTI login failed");
            } else {
                warn!(error_kind = e.kind(), error = %e, issuer, "LTI login rejected");
            }
        }
        result
    }

    async fn run_login(
        &self,
        params: &LoginInitiationParams,
        now: DateTime<Utc>,
    ) -> Result<Url, LtiError> {
        let issuer = required(params.iss.as_deref(), "iss")?;
        let login_hint = required(params.login_hint.as_deref(), "login_hint")?;
        let client_id = present(params.client_id.as_deref());

        let platform = self.registry().resolve(issuer, client_id)?;

        self.sweep_expired(now).await;

        let settings = self.settings();
        let state = generate_token();
        let nonce = generate_token();
        let login_state = LoginState::new(
            state.clone(),
            nonce.clone(),
            issuer.to_owned(),
            platform.client_id.clone(),
            present(params.target_link_uri.as_deref()).map(str::to_owned),
            now,
            settings.login_state_ttl,
        );
        let nonce_record = NonceRecord::new(
            nonce.clone(),
            issuer.to_owned(),
            now,
            settings.login_state_ttl,
        );
        self.replay().store_login_state(&login_state).await?;
        self.replay().store_nonce(&nonce_record).await?;

        let redirect = build_auth_request_url(
            platform,
            &settings.launch_url,
            login_hint,
            present(params.lti_message_hint.as_deref()),
            &state,
            &nonce,
        );
        info!(issuer, client_id = %platform.client_id, "LTI login initiated");
        Ok(redirect)
    }

    /// Drop expired anti-replay tokens and sessions; failures are logged only
    async fn sweep_expired(&self, now: DateTime<Utc>) {
        match self.replay().purge_expired(now).await {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "purged expired login states and nonces"),
            Err(e) => warn!(error = %e, "failed to purge expired login states"),
        }
        match self.launch_store().purge_expired_sessions(now).await {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "purged expired sessions"),
            Err(e) => warn!(error = %e, "failed to purge expired sessions"),
        }
    }
}
