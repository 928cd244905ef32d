// ABOUTME: Platform trust entry supplied by configuration
// ABOUTME: Names the client_id, authorization endpoint, and key set of one LMS registration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use serde::{Deserialize, Serialize};
use url::Url;

/// One registered LTI platform (LMS) this tool trusts
///
/// Immutable after load. Keyed in the registry by issuer or `issuer::client_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// OAuth client id the platform issued to this tool
    pub client_id: String,
    /// Platform OIDC authorization endpoint
    pub auth_endpoint: Url,
    /// Platform JWKS endpoint
    pub jwks_uri: Url,
}
