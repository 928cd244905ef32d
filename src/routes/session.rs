// ABOUTME: Session introspection and logout endpoints for first-party clients
// ABOUTME: Both require the session cookie issued by a verified launch
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::errors::AppError;
use crate::middleware::AuthenticatedSession;
use crate::models::SessionIdentity;
use crate::security::cookies::{expired_session_cookie, SameSite};
use crate::server::ServerResources;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Session routes implementation
pub struct SessionRoutes;

impl SessionRoutes {
    /// Create the session routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/session", get(Self::handle_whoami))
            .route("/api/session/logout", post(Self::handle_logout))
            .with_state(resources)
    }

    async fn handle_whoami(session: AuthenticatedSession) -> Json<SessionIdentity> {
        Json(session.identity)
    }

    async fn handle_logout(
        State(resources): State<Arc<ServerResources>>,
        session: AuthenticatedSession,
    ) -> Result<Response, AppError> {
        resources.database.delete_session(&session.token_hash).await?;
        tracing::info!(user_id = %session.identity.user_id, "session logged out");
        let cookie = expired_session_cookie(SameSite::Lax, resources.config.session.secure_cookies);
        Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response())
    }
}
