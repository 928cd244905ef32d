// ABOUTME: Outbound HTTP client construction for platform key set retrieval
// ABOUTME: Clients are built with explicit timeouts, rustls verification, and an HTTPS-only switch
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::constants::defaults;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Settings for the JWKS client
#[derive(Debug, Clone)]
pub struct JwksClientSettings {
    /// Whole-request timeout
    pub timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Refuse plain `http://` URLs
    pub https_only: bool,
}

impl Default for JwksClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(defaults::JWKS_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(defaults::JWKS_CONNECT_TIMEOUT_SECS),
            https_only: true,
        }
    }
}

/// Create the client used to fetch platform key sets
///
/// Unlike general-purpose clients this never falls back to a default
/// `Client` on build failure, since that would drop the timeout and
/// HTTPS-only guarantees.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised
pub fn jwks_client(settings: &JwksClientSettings) -> Result<Client, reqwest::Error> {
    create_custom_client(|builder| {
        builder
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .https_only(settings.https_only)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("coursedesk-server/", env!("CARGO_PKG_VERSION")))
    })
}

/// Create a client from a customised builder
///
/// # Errors
///
/// Returns an error if the client cannot be built
pub fn create_custom_client<F>(config_fn: F) -> Result<Client, reqwest::Error>
where
    F: FnOnce(ClientBuilder) -> ClientBuilder,
{
    config_fn(ClientBuilder::new()).build()
}
