// ABOUTME: LTI 1.3 and OIDC protocol constants
// ABOUTME: Supported version and algorithm, authorization request values, and role URI fragments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// The only LTI version accepted
pub const SUPPORTED_VERSION: &str = "1.3.0";

/// Only signature algorithm accepted on id_tokens
pub const RS256: &str = "RS256";

/// JWK key type for RSA keys
pub const KTY_RSA: &str = "RSA";

/// Values of the OIDC authorization redirect
pub mod auth_request {
    /// `scope`
    pub const SCOPE: &str = "openid";
    /// `response_type`
    pub const RESPONSE_TYPE: &str = "id_token";
    /// `response_mode`
    pub const RESPONSE_MODE: &str = "form_post";
    /// `prompt`
    pub const PROMPT: &str = "none";
}

/// Role URI fragments that grant the instructor role
pub const INSTRUCTOR_ROLE_FRAGMENTS: &[&str] = &["#Instructor", "#TeachingAssistant"];
