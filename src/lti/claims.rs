// ABOUTME: id_token claim model and the standard OIDC and LTI claim checks
// ABOUTME: Time checks take an explicit `now` so expiry boundaries are testable
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::constants::lti::SUPPORTED_VERSION;
use crate::errors::LtiError;
use crate::models::{CourseContext, UserProfile};
use serde::Deserialize;

/// `aud` is either one string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// Single audience
    Single(String),
    /// Multiple audiences
    Multiple(Vec<String>),
}

impl Audience {
    /// Whether `client_id` is one of the audiences
    #[must_use]
    pub fn contains(&self, client_id: &str) -> bool {
        match self {
            Self::Single(aud) => aud == client_id,
            Self::Multiple(auds) => auds.iter().any(|aud| aud == client_id),
        }
    }

    /// Number of audiences
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(auds) => auds.len(),
        }
    }

    /// Whether the audience list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// LTI context claim
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContextClaim {
    /// Context id, unique per issuer
    #[serde(default)]
    pub id: String,
    /// Course title
    #[serde(default)]
    pub title: Option<String>,
    /// Course short label
    #[serde(default)]
    pub label: Option<String>,
}

/// Claims carried by an LTI resource link launch
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchClaims {
    /// Issuer
    pub iss: String,
    /// Subject, the platform's user id
    pub sub: String,
    /// Audience
    pub aud: Audience,
    /// Expiry, unix seconds
    pub exp: i64,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Nonce echoed from the authentication request
    #[serde(default)]
    pub nonce: Option<String>,
    /// Authorized party
    #[serde(default)]
    pub azp: Option<String>,
    /// Full name
    #[serde(default)]
    pub name: Option<String>,
    /// Given name
    #[serde(default)]
    pub given_name: Option<String>,
    /// Family name
    #[serde(default)]
    pub family_name: Option<String>,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// LTI version
    #[serde(default, rename = "https://purl.imsglobal.org/spec/lti/claim/version")]
    pub version: Option<String>,
    /// Course context
    #[serde(default, rename = "https://purl.imsglobal.org/spec/lti/claim/context")]
    pub context: Option<ContextClaim>,
    /// Role URIs
    #[serde(default, rename = "https://purl.imsglobal.org/spec/lti/claim/roles")]
    pub roles: Vec<String>,
}

impl LaunchClaims {
    /// Display name, composed from given and family names when `name` is absent
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return Some(name.to_owned());
        }
        let parts: Vec<&str> = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    /// Profile for the user upsert
    #[must_use]
    pub fn user_profile(&self) -> UserProfile {
        UserProfile {
            issuer: self.iss.clone(),
            subject: self.sub.clone(),
            name: self.display_name(),
            email: self.email.clone().filter(|e| !e.trim().is_empty()),
        }
    }

    /// Course for the course upsert
    ///
    /// # Errors
    ///
    /// Returns [`LtiError::MissingCourseContext`] without a context id
    pub fn course_context(&self) -> Result<CourseContext, LtiError> {
        let context = self
            .context
            .as_ref()
            .filter(|c| !c.id.trim().is_empty())
            .ok_or(LtiError::MissingCourseContext)?;
        Ok(CourseContext {
            issuer: self.iss.clone(),
            context_id: context.id.clone(),
            title: context.title.clone(),
            label: context.label.clone(),
        })
    }
}

/// Expected values for one launch
#[derive(Debug, Clone, Copy)]
pub struct ClaimValidator<'a> {
    /// Issuer recorded in the login state
    pub anchor_issuer: &'a str,
    /// Registered `client_id`
    pub client_id: &'a str,
    /// Allowed forward clock drift for `iat`, seconds
    pub clock_skew_secs: i64,
}

impl ClaimValidator<'_> {
    /// Subject, expiry, issue time, issuer and audience checks
    ///
    /// # Errors
    ///
    /// Returns the first failing check
    pub fn validate_standard(&self, claims: &LaunchClaims, now: i64) -> Result<(), LtiError> {
        if claims.sub.trim().is_empty() {
            return Err(LtiError::MalformedToken("empty sub claim".to_owned()));
        }
        if claims.exp <= now {
            return Err(LtiError::ClaimExpired {
                exp: claims.exp,
                now,
            });
        }
        if claims.iat > now.saturating_add(self.clock_skew_secs) {
            return Err(LtiError::ClaimIssuedInFuture {
                iat: claims.iat,
                now,
            });
        }
        if claims.iss != self.anchor_issuer {
            return Err(LtiError::IssuerMismatch {
                expected: self.anchor_issuer.to_owned(),
                actual: claims.iss.clone(),
            });
        }
        if !claims.aud.contains(self.client_id) {
            return Err(LtiError::AudienceMismatch(format!(
                "aud does not contain client_id {}",
                self.client_id
            )));
        }
        if claims.aud.len() > 1 {
            if let Some(azp) = claims.azp.as_deref() {
                if azp != self.client_id {
                    return Err(LtiError::AudienceMismatch(format!(
                        "azp {azp} is not client_id {}",
                        self.client_id
                    )));
                }
            }
        }
        Ok(())
    }

    /// LTI version and course context checks
    ///
    /// # Errors
    ///
    /// Returns the first failing check
    pub fn validate_lti(&self, claims: &LaunchClaims) -> Result<(), LtiError> {
        match claims.version.as_deref() {
            Some(SUPPORTED_VERSION) => {}
            other => {
                return Err(LtiError::UnsupportedLtiVersion(
                    other.unwrap_or("<absent>").to_owned(),
                ))
            }
        }
        claims.course_context().map(|_| ())
    }
}
