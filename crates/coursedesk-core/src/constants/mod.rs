// ABOUTME: Constants module with domain-separated organization
// ABOUTME: LTI protocol identifiers, cookie names, and configuration defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single large file.

/// LTI 1.3 claim names, protocol values, and role fragments
pub mod lti;

/// Service identity used in logs and responses
pub mod service_names {
    /// Name of the HTTP service
    pub const COURSEDESK_SERVER: &str = "coursedesk-server";
}

/// Cookie names
pub mod cookies {
    /// Session cookie set after a successful launch
    pub const SESSION_COOKIE_NAME: &str = "coursedesk_session";
}

/// Defaults for environment-driven configuration
pub mod defaults {
    /// HTTP listen port
    pub const HTTP_PORT: u16 = 8080;
    /// Public base URL of this service
    pub const BASE_URL: &str = "http://localhost:8080";
    /// SQLite database location
    pub const DATABASE_URL: &str = "sqlite:./data/coursedesk.db";
    /// Lifetime of a login state and its nonce
    pub const LOGIN_STATE_TTL_SECS: i64 = 600;
    /// Allowed future drift of `iat`
    pub const CLOCK_SKEW_SECS: i64 = 30;
    /// Total timeout of a JWKS request
    pub const JWKS_TIMEOUT_SECS: u64 = 5;
    /// Connect timeout of a JWKS request
    pub const JWKS_CONNECT_TIMEOUT_SECS: u64 = 3;
    /// Largest JWKS body accepted (512 KiB)
    pub const MAX_JWKS_BYTES: usize = 512 * 1024;
    /// Session lifetime (8 hours)
    pub const SESSION_TTL_SECS: i64 = 8 * 60 * 60;
    /// Where a launch lands when its target link is unusable
    pub const LANDING_PATH: &str = "/";
    /// Path of the launch endpoint, appended to the base URL to form `redirect_uri`
    pub const LAUNCH_PATH: &str = "/lti/launch";
    /// Path of the login-initiation endpoint
    pub const LOGIN_PATH: &str = "/lti/login";
}
