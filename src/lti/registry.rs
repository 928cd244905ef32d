// ABOUTME: Trust anchor lookup from (issuer, client_id) to a platform's endpoints
// ABOUTME: Exact issuer::client_id match wins over a bare-issuer entry; built once at startup and read-only after
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::errors::LtiError;
use crate::models::PlatformConfig;
use std::collections::HashMap;
use thiserror::Error;

/// Separator between issuer and `client_id` in compound keys
pub const KEY_SEPARATOR: &str = "::";

/// Registry construction failures
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registry document could not be parsed
    #[error("invalid platform registry JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// Entry key has no issuer part
    #[error("platform registry key {0:?} has an empty issuer")]
    EmptyIssuer(String),
    /// Compound key names a different `client_id` than its entry
    #[error("platform registry key {key:?} does not match entry client_id {client_id:?}")]
    ClientIdConflict {
        /// Offending key
        key: String,
        /// `client_id` inside the entry
        client_id: String,
    },
}

/// Registered platforms keyed by `issuer` or `issuer::client_id`
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<String, PlatformConfig>,
}

impl PlatformRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the compound lookup key
    #[must_use]
    pub fn compound_key(issuer: &str, client_id: &str) -> String {
        format!("{issuer}{KEY_SEPARATOR}{client_id}")
    }

    /// Parse a JSON object mapping keys to platform configurations
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or any entry is inconsistent
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let entries: HashMap<String, PlatformConfig> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (key, config) in entries {
            registry.register(key, config)?;
        }
        Ok(registry)
    }

    /// Add or replace an entry
    ///
    /// # Errors
    ///
    /// Returns an error if the key has no issuer, or a compound key disagrees
    /// with the entry's `client_id`
    pub fn register(
        &mut self,
        key: impl Into<String>,
        config: PlatformConfig,
    ) -> Result<(), RegistryError> {
        let key = key.into();
        let (issuer, client_id) = split_key(&key);
        if issuer.trim().is_empty() {
            return Err(RegistryError::EmptyIssuer(key));
        }
        if let Some(client_id) = client_id {
            if client_id != config.client_id {
                return Err(RegistryError::ClientIdConflict {
                    key,
                    client_id: config.client_id,
                });
            }
        }
        self.platforms.insert(key, config);
        Ok(())
    }

    /// Resolve the platform for a login or launch
    ///
    /// With a `client_id`, the compound entry is tried first, then the bare
    /// issuer entry whose own `client_id` must match.
    ///
    /// # Errors
    ///
    /// Returns [`LtiError::UnregisteredPlatform`] when nothing matches and
    /// [`LtiError::ClientIdMismatch`] when only a conflicting bare entry exists
    pub fn resolve(
        &self,
        issuer: &str,
        client_id: Option<&str>,
    ) -> Result<&PlatformConfig, LtiError> {
        let client_id = client_id.filter(|id| !id.is_empty());

        if let Some(client_id) = client_id {
            if let Some(config) = self.platforms.get(&Self::compound_key(issuer, client_id)) {
                return Ok(config);
            }
        }

        let config =
            self.platforms
                .get(issuer)
                .ok_or_else(|| LtiError::UnregisteredPlatform {
                    issuer: issuer.to_owned(),
                })?;

        match client_id {
            Some(presented) if presented != config.client_id => Err(LtiError::ClientIdMismatch {
                issuer: issuer.to_owned(),
                presented: presented.to_owned(),
            }),
            _ => Ok(config),
        }
    }

    /// Number of registered entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    /// Whether no platforms are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

/// Split a registry key into issuer and optional `client_id`
///
/// The separator is only searched after a bracketed IPv6 host, so
/// `https://[::1]:8443` is a bare issuer.
fn split_key(key: &str) -> (&str, Option<&str>) {
    let host_end = key.find(']').map_or(0, |i| i + 1);
    match key[host_end..].find(KEY_SEPARATOR) {
        Some(offset) => {
            let at = host_end + offset;
            (&key[..at], Some(&key[at + KEY_SEPARATOR.len()..]))
        }
        None => (key, None),
    }
}
