// ABOUTME: LTI service wiring and the two-state command dispatch used by the HTTP layer
// ABOUTME: Registry, replay store, key fetcher and launch store are injected so tests can substitute fakes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::jwks::JwksFetcher;
use super::launch::{LaunchForm, LaunchStore, LaunchSuccess};
use super::login::LoginInitiationParams;
use super::registry::PlatformRegistry;
use super::replay::ReplayStore;
use crate::config::environment::ServerConfig;
use crate::constants::defaults::LAUNCH_PATH;
use crate::errors::LtiError;
use chrono::Duration;
use std::sync::Arc;
use url::Url;

/// Time limits and URLs the handshake needs
#[derive(Debug, Clone)]
pub struct LtiSettings {
    /// Public base URL of this service
    pub base_url: Url,
    /// Absolute launch endpoint, sent as `redirect_uri`
    pub launch_url: Url,
    /// Fallback destination after a launch
    pub landing_url: Url,
    /// Lifetime of login states and nonces
    pub login_state_ttl: Duration,
    /// Allowed forward drift of `iat`, seconds
    pub clock_skew_secs: i64,
    /// Lifetime of issued sessions
    pub session_ttl: Duration,
}

impl LtiSettings {
    /// Derive settings from the server configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the landing path cannot be joined to the base URL
    pub fn from_config(config: &ServerConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            launch_url: config.base_url.join(LAUNCH_PATH)?,
            landing_url: config.base_url.join(&config.lti.landing_path)?,
            base_url: config.base_url.clone(),
            login_state_ttl: Duration::seconds(config.lti.login_state_ttl_secs),
            clock_skew_secs: config.lti.clock_skew_secs,
            session_ttl: Duration::seconds(config.session.ttl_secs),
        })
    }

    /// Post-launch destination: the requested target only when same-origin
    #[must_use]
    pub fn redirect_target(&self, target_link_uri: Option<&str>) -> Url {
        target_link_uri
            .and_then(|target| Url::parse(target).ok())
            .filter(|target| target.origin() == self.base_url.origin())
            .unwrap_or_else(|| self.landing_url.clone())
    }
}

/// Route-level command
#[derive(Debug, Clone)]
pub enum LtiCommand {
    /// Third-party login initiation
    LoginInitiate(LoginInitiationParams),
    /// Form-posted launch
    Launch(LaunchForm),
}

/// Successful command result
#[derive(Debug, Clone)]
pub enum LtiOutcome {
    /// Send the browser to the platform's authorization endpoint
    RedirectToPlatform(Url),
    /// A session was issued
    SessionIssued(LaunchSuccess),
}

/// LTI 1.3 login and launch handling
#[derive(Clone)]
pub struct LtiService {
    registry: Arc<PlatformRegistry>,
    replay: Arc<dyn ReplayStore>,
    jwks: Arc<dyn JwksFetcher>,
    launch_store: Arc<dyn LaunchStore>,
    settings: LtiSettings,
}

impl LtiService {
    /// Wire a service from its collaborators
    #[must_use]
    pub fn new(
        registry: Arc<PlatformRegistry>,
        replay: Arc<dyn ReplayStore>,
        jwks: Arc<dyn JwksFetcher>,
        launch_store: Arc<dyn LaunchStore>,
        settings: LtiSettings,
    ) -> Self {
        Self {
            registry,
            replay,
            jwks,
            launch_store,
            settings,
        }
    }

    /// Execute a command
    ///
    /// # Errors
    ///
    /// Propagates the login or launch failure
    pub async fn handle(&self, command: LtiCommand) -> Result<LtiOutcome, LtiError> {
        match command {
            LtiCommand::LoginInitiate(params) => self
                .initiate_login(&params)
                .await
                .map(LtiOutcome::RedirectToPlatform),
            LtiCommand::Launch(form) => self.launch(&form).await.map(LtiOutcome::SessionIssued),
        }
    }

    /// Handshake settings
    #[must_use]
    pub const fn settings(&self) -> &LtiSettings {
        &self.settings
    }

    pub(crate) fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    pub(crate) fn replay(&self) -> &dyn ReplayStore {
        self.replay.as_ref()
    }

    pub(crate) fn jwks(&self) -> &dyn JwksFetcher {
        self.jwks.as_ref()
    }

    pub(crate) fn launch_store(&self) -> &dyn LaunchStore {
        self.launch_store.as_ref()
    }
}

impl std::fmt::Debug for LtiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LtiService")
            .field("platforms", &self.registry.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LtiSettings {
        let base_url = Url::parse("https://tool.example.com").unwrap();
        LtiSettings {
            launch_url: base_url.join("/lti/launch").unwrap(),
            landing_url: base_url.join("/courses").unwrap(),
            base_url,
            login_state_ttl: Duration::seconds(600),
            clock_skew_secs: 30,
            session_ttl: Duration::seconds(3600),
        }
    }

    #[test]
    fn test_same_origin_target_is_kept() {
        let target = settings().redirect_target(Some("https://tool.example.com/c/42?tab=1"));
        assert_eq!(target.as_str(), "https://tool.example.com/c/42?tab=1");
    }

    #[test]
    fn test_foreign_or_invalid_target_uses_landing() {
        let s = settings();
        for target in [
            Some("https://evil.example/phish"),
            Some("http://tool.example.com/c/42"),
            Some("https://tool.example.com:8443/c/42"),
            Some("not a url"),
            None,
        ] {
            assert_eq!(s.redirect_target(target).as_str(), "https://tool.example.com/courses");
        }
    }
}
