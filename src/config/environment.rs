// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses ports, public URL, database location, and LTI/session security knobs from env vars
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Environment-based configuration

use crate::constants::defaults;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::{info, warn};
use url::Url;

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// LTI handshake configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtiConfig {
    /// Lifetime of login states and nonces, seconds
    pub login_state_ttl_secs: i64,
    /// Allowed forward drift of `iat`, seconds
    pub clock_skew_secs: i64,
    /// Key set request timeout, seconds
    pub jwks_timeout_secs: u64,
    /// Permit `http://` key set URLs (local development only)
    pub allow_insecure_jwks: bool,
    /// Include failure detail in error responses
    pub debug_errors: bool,
    /// Post-launch destination when the target is not same-origin
    pub landing_path: String,
}

impl Default for LtiConfig {
    fn default() -> Self {
        Self {
            login_state_ttl_secs: defaults::LOGIN_STATE_TTL_SECS,
            clock_skew_secs: defaults::CLOCK_SKEW_SECS,
            jwks_timeout_secs: defaults::JWKS_TIMEOUT_SECS,
            allow_insecure_jwks: false,
            debug_errors: false,
            landing_path: defaults::LANDING_PATH.to_owned(),
        }
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime, seconds
    pub ttl_secs: i64,
    /// Add the `Secure` attribute to session cookies
    pub secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::SESSION_TTL_SECS,
            secure_cookies: true,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Public base URL, used for the launch `redirect_uri` and redirect checks
    pub base_url: Url,
    /// Deployment environment
    pub environment: Environment,
    /// SQLite URL
    pub database_url: String,
    /// LTI settings
    pub lti: LtiConfig,
    /// Session settings
    pub session: SessionConfig,
}

impl ServerConfig {
    /// Configuration with defaults for the given base URL
    #[must_use]
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            http_port: defaults::HTTP_PORT,
            base_url,
            environment: Environment::Development,
            database_url: defaults::DATABASE_URL.to_owned(),
            lti: LtiConfig::default(),
            session: SessionConfig::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if any variable fails to parse or [`Self::validate`] fails
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let base_url = env_var_or("BASE_URL", defaults::BASE_URL);
        let config = Self {
            http_port: parse_env("HTTP_PORT", defaults::HTTP_PORT)?,
            base_url: Url::parse(&base_url)
                .with_context(|| format!("Invalid BASE_URL value: {base_url}"))?,
            environment: Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development")),
            database_url: env_var_or("DATABASE_URL", defaults::DATABASE_URL),
            lti: LtiConfig {
                login_state_ttl_secs: parse_env(
                    "LTI_LOGIN_STATE_TTL_SECS",
                    defaults::LOGIN_STATE_TTL_SECS,
                )?,
                clock_skew_secs: parse_env("LTI_CLOCK_SKEW_SECS", defaults::CLOCK_SKEW_SECS)?,
                jwks_timeout_secs: parse_env("LTI_JWKS_TIMEOUT_SECS", defaults::JWKS_TIMEOUT_SECS)?,
                allow_insecure_jwks: parse_bool_env("LTI_ALLOW_INSECURE_JWKS", false)?,
                debug_errors: parse_bool_env("LTI_DEBUG", false)?,
                landing_path: env_var_or("LTI_LANDING_PATH", defaults::LANDING_PATH),
            },
            session: SessionConfig {
                ttl_secs: parse_env("SESSION_TTL_SECS", defaults::SESSION_TTL_SECS)?,
                secure_cookies: parse_bool_env("SESSION_SECURE_COOKIES", true)?,
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range values, or for development-only
    /// switches enabled in production
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            bail!("BASE_URL must be an http(s) URL");
        }
        if self.lti.login_state_ttl_secs <= 0 || self.session.ttl_secs <= 0 {
            bail!("LTI_LOGIN_STATE_TTL_SECS and SESSION_TTL_SECS must be positive");
        }
        if self.lti.clock_skew_secs < 0 {
            bail!("LTI_CLOCK_SKEW_SECS cannot be negative");
        }
        if self.lti.jwks_timeout_secs == 0 {
            bail!("LTI_JWKS_TIMEOUT_SECS must be positive");
        }
        if !self.lti.landing_path.starts_with('/') {
            bail!("LTI_LANDING_PATH must be an absolute path");
        }

        if self.environment.is_production() {
            if self.base_url.scheme() != "https" {
                bail!("BASE_URL must use https in production");
            }
            if !self.session.secure_cookies {
                bail!("SESSION_SECURE_COOKIES cannot be disabled in production");
            }
            if self.lti.allow_insecure_jwks {
                bail!("LTI_ALLOW_INSECURE_JWKS cannot be enabled in production");
            }
            if self.lti.debug_errors {
                bail!("LTI_DEBUG cannot be enabled in production");
            }
        } else {
            if self.lti.allow_insecure_jwks {
                warn!("Plain HTTP key set URLs are permitted");
            }
            if self.lti.debug_errors {
                warn!("LTI error detail is exposed in responses");
            }
        }

        Ok(())
    }

    /// One-line summary for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} base_url={} environment={} secure_cookies={} lti_debug={}",
            self.http_port,
            self.base_url,
            self.environment,
            self.session.secure_cookies,
            self.lti.debug_errors
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back when unset
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {value}")),
        Err(_) => Ok(default),
    }
}

/// Parse a boolean flag accepting `true/false/1/0/yes/no`
fn parse_bool_env(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => bail!("Invalid {key} value: {value}"),
        },
        Err(_) => Ok(default),
    }
}
