// ABOUTME: Platform key set retrieval and signing-key selection for id_token verification
// ABOUTME: Fetches are per-launch, HTTPS-only by default, time-bounded, and size-capped
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::constants::{defaults, lti};
use crate::crypto::{JsonWebKey, JsonWebKeySet};
use crate::errors::LtiError;
use crate::utils::http_client::{jwks_client, JwksClientSettings};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

/// Source of platform key sets
#[async_trait]
pub trait JwksFetcher: Send + Sync {
    /// Retrieve the key set published at `jwks_uri`
    async fn fetch(&self, jwks_uri: &Url) -> Result<JsonWebKeySet, LtiError>;
}

/// Fetches key sets over HTTPS with reqwest
#[derive(Debug, Clone)]
pub struct HttpJwksFetcher {
    client: Client,
    allow_insecure: bool,
    max_bytes: usize,
}

impl HttpJwksFetcher {
    /// Create a fetcher
    ///
    /// `allow_insecure` permits `http://` key set URLs and is meant for local
    /// development only.
    ///
    /// # Errors
    ///
    /// Returns [`LtiError::JwksFetchFailure`] if the HTTP client cannot be built
    pub fn new(mut settings: JwksClientSettings, allow_insecure: bool) -> Result<Self, LtiError> {
        settings.https_only = !allow_insecure;
        let client = jwks_client(&settings)
            .map_err(|e| LtiError::JwksFetchFailure(format!("client build failed: {e}")))?;
        Ok(Self {
            client,
            allow_insecure,
            max_bytes: defaults::MAX_JWKS_BYTES,
        })
    }

    /// Override the response size cap
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

#[async_trait]
impl JwksFetcher for HttpJwksFetcher {
    async fn fetch(&self, jwks_uri: &Url) -> Result<JsonWebKeySet, LtiError> {
        if jwks_uri.scheme() != "https" && !self.allow_insecure {
            return Err(LtiError::JwksFetchFailure(format!(
                "refusing non-HTTPS key set URL {jwks_uri}"
            )));
        }

        debug!(jwks_uri = %jwks_uri, "fetching platform key set");
        let mut response = self
            .client
            .get(jwks_uri.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| LtiError::JwksFetchFailure(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LtiError::JwksFetchFailure(format!(
                "key set endpoint returned {status}"
            )));
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(LtiError::JwksFetchFailure(format!(
                "key set exceeds {} bytes",
                self.max_bytes
            )));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| LtiError::JwksFetchFailure(format!("read failed: {e}")))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(LtiError::JwksFetchFailure(format!(
                    "key set exceeds {} bytes",
                    self.max_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }

        serde_json::from_slice(&body)
            .map_err(|e| LtiError::JwksFetchFailure(format!("invalid key set document: {e}")))
    }
}

/// Whether a key may be used to verify an RS256 signature
fn is_rs256_signing_key(key: &JsonWebKey) -> bool {
    key.kty == lti::KTY_RSA
        && key.alg.as_deref().is_none_or(|alg| alg == lti::RS256)
        && key.key_use.as_deref().is_none_or(|u| u == "sig")
}

/// Pick the verification key for a token
///
/// A `kid` in the token header must match a published key exactly. Only a
/// token without `kid` falls back to the first usable RSA key.
///
/// # Errors
///
/// Returns [`LtiError::KeyNotFound`] when no usable key matches
pub fn select_key<'a>(
    set: &'a JsonWebKeySet,
    kid: Option<&str>,
) -> Result<&'a JsonWebKey, LtiError> {
    if let Some(kid) = kid {
        let key = set
            .find(kid)
            .ok_or_else(|| LtiError::KeyNotFound(format!("no key with kid {kid}")))?;
        if !is_rs256_signing_key(key) {
            return Err(LtiError::KeyNotFound(format!(
                "key {kid} is not an RS256 signing key"
            )));
        }
        return Ok(key);
    }

    let key = set
        .keys
        .iter()
        .find(|key| is_rs256_signing_key(key))
        .ok_or_else(|| LtiError::KeyNotFound("key set has no RSA signing key".to_owned()))?;
    warn!(
        selected_kid = key.kid.as_deref().unwrap_or("<none>"),
        "id_token header has no kid; using first RSA signing key"
    );
    Ok(key)
}
