// ABOUTME: Axum extractor that turns the session cookie into (user_id, course_id, role)
// ABOUTME: This is the only view of an LTI launch that downstream handlers receive
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::constants::cookies::SESSION_COOKIE_NAME;
use crate::crypto::hash_token;
use crate::errors::AppError;
use crate::models::SessionIdentity;
use crate::security::cookies::get_cookie_value;
use crate::server::ServerResources;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use std::sync::Arc;

/// Identity of the caller's live session
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    /// Session identity
    pub identity: SessionIdentity,
    /// Hash of the presented token, for logout
    pub(crate) token_hash: String,
}

#[async_trait]
impl FromRequestParts<Arc<ServerResources>> for AuthenticatedSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        resources: &Arc<ServerResources>,
    ) -> Result<Self, Self::Rejection> {
        let token = get_cookie_value(&parts.headers, SESSION_COOKIE_NAME)
            .ok_or_else(AppError::auth_required)?;
        let token_hash = hash_token(&token);

        let identity = resources
            .database
            .find_session(&token_hash, Utc::now())
            .await?
            .ok_or_else(|| {
                tracing::debug!("session cookie did not match a live session");
                AppError::auth_expired()
            })?;

        Ok(Self {
            identity,
            token_hash,
        })
    }
}
