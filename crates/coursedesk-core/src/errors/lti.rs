// ABOUTME: Failure taxonomy for the LTI 1.3 login-initiation and launch handshake
// ABOUTME: Every variant is fatal and non-retryable; callers only ever see a generic relaunch message
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::{AppError, DatabaseError, ErrorCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Generic message returned to the browser for every launch failure
pub const RELAUNCH_MESSAGE: &str =
    "Authentication failed. Please relaunch the tool from your course.";

/// Machine code returned to the browser for every launch failure
pub const GENERIC_ERROR_CODE: &str = "LTI_AUTHENTICATION_FAILED";

/// LTI handshake failures
///
/// The `Display` text carries full detail and is meant for server logs only.
#[derive(Debug, Error)]
pub enum LtiError {
    /// A required request parameter was absent or empty
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// No trust entry exists for the presented issuer
    #[error("no platform registered for issuer {issuer}")]
    UnregisteredPlatform {
        /// Issuer as presented by the caller
        issuer: String,
    },

    /// A trust entry was found but the presented `client_id` differs from it
    #[error("client_id {presented} does not match the registration for issuer {issuer}")]
    ClientIdMismatch {
        /// Issuer of the matched registration
        issuer: String,
        /// `client_id` supplied by the caller
        presented: String,
    },

    /// The `id_token` is not a structurally valid compact JWS
    #[error("malformed id_token: {0}")]
    MalformedToken(String),

    /// No usable public key could be selected or reconstructed
    #[error("no usable signing key: {0}")]
    KeyNotFound(String),

    /// The RS256 signature did not verify
    #[error("id_token signature verification failed")]
    SignatureInvalid,

    /// `exp` is not strictly in the future
    #[error("id_token expired: exp {exp}, now {now}")]
    ClaimExpired {
        /// Token expiry (unix seconds)
        exp: i64,
        /// Verification time (unix seconds)
        now: i64,
    },

    /// `iat` lies further in the future than the clock-skew allowance
    #[error("id_token issued in the future: iat {iat}, now {now}")]
    ClaimIssuedInFuture {
        /// Token issue time (unix seconds)
        iat: i64,
        /// Verification time (unix seconds)
        now: i64,
    },

    /// Token `iss` differs from the issuer recorded at login initiation
    #[error("issuer mismatch: expected {expected}, got {actual}")]
    IssuerMismatch {
        /// Anchor issuer from the login state
        expected: String,
        /// Issuer claimed by the token
        actual: String,
    },

    /// Token audience does not name this tool's `client_id`
    #[error("audience mismatch: {0}")]
    AudienceMismatch(String),

    /// Nonce absent, different from the login nonce, expired, or already consumed
    #[error("nonce invalid or already used")]
    NonceInvalidOrReused,

    /// State unknown, expired, or already consumed
    #[error("state invalid, expired, or already used")]
    StateInvalidOrReused,

    /// LTI version claim is not `1.3.0`
    #[error("unsupported LTI version: {0}")]
    UnsupportedLtiVersion(String),

    /// Launch carries no context claim with a non-empty id
    #[error("launch carries no course context")]
    MissingCourseContext,

    /// The platform key set could not be retrieved or parsed
    #[error("failed to fetch JWKS: {0}")]
    JwksFetchFailure(String),

    /// Persistence failed while consuming tokens or issuing the session
    #[error("storage failure: {0}")]
    Storage(#[from] DatabaseError),
}

impl LtiError {
    /// Stable machine-readable name of the failure class
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "MISSING_PARAMETER",
            Self::UnregisteredPlatform { .. } => "UNREGISTERED_PLATFORM",
            Self::ClientIdMismatch { .. } => "CLIENT_ID_MISMATCH",
            Self::MalformedToken(_) => "MALFORMED_TOKEN",
            Self::KeyNotFound(_) => "KEY_NOT_FOUND",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::ClaimExpired { .. } => "CLAIM_EXPIRED",
            Self::ClaimIssuedInFuture { .. } => "CLAIM_ISSUED_IN_FUTURE",
            Self::IssuerMismatch { .. } => "ISSUER_MISMATCH",
            Self::AudienceMismatch(_) => "AUDIENCE_MISMATCH",
            Self::NonceInvalidOrReused => "NONCE_INVALID_OR_REUSED",
            Self::StateInvalidOrReused => "STATE_INVALID_OR_REUSED",
            Self::UnsupportedLtiVersion(_) => "UNSUPPORTED_LTI_VERSION",
            Self::MissingCourseContext => "MISSING_COURSE_CONTEXT",
            Self::JwksFetchFailure(_) => "JWKS_FETCH_FAILURE",
            Self::Storage(_) => "STORAGE_FAILURE",
        }
    }

    /// HTTP status for this failure
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::MissingParameter(_)
            | Self::UnregisteredPlatform { .. }
            | Self::ClientIdMismatch { .. } => 400,
            Self::JwksFetchFailure(_) => 502,
            Self::Storage(_) => 500,
            _ => 401,
        }
    }

    /// Map onto the generic application error code space
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingParameter(_) => ErrorCode::MissingRequiredField,
            Self::UnregisteredPlatform { .. } | Self::ClientIdMismatch { .. } => {
                ErrorCode::InvalidInput
            }
            Self::MalformedToken(_) => ErrorCode::AuthMalformed,
            Self::ClaimExpired { .. } => ErrorCode::AuthExpired,
            Self::JwksFetchFailure(_) => ErrorCode::ExternalServiceError,
            Self::Storage(_) => ErrorCode::DatabaseError,
            _ => ErrorCode::AuthInvalid,
        }
    }

    /// Build the response body; detail is only included when `debug` is set
    #[must_use]
    pub fn to_response_body(&self, debug: bool) -> LtiErrorResponse {
        LtiErrorResponse {
            error: GENERIC_ERROR_CODE.to_owned(),
            message: RELAUNCH_MESSAGE.to_owned(),
            kind: debug.then(|| self.kind().to_owned()),
            detail: debug.then(|| self.to_string()),
        }
    }
}

impl From<LtiError> for AppError {
    fn from(error: LtiError) -> Self {
        Self::new(error.error_code(), RELAUNCH_MESSAGE)
    }
}

/// Body returned for any LTI handshake failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtiErrorResponse {
    /// Always [`GENERIC_ERROR_CODE`]
    pub error: String,
    /// Always [`RELAUNCH_MESSAGE`]
    pub message: String,
    /// Failure class, debug mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Full failure detail, debug mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(feature = "http-response")]
impl LtiError {
    /// Render as an HTTP response, honouring the debug flag
    #[must_use]
    pub fn into_http_response(self, debug: bool) -> axum::response::Response {
        use axum::response::IntoResponse;

        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::UNAUTHORIZED);
        (status, axum::Json(self.to_response_body(debug))).into_response()
    }
}
