// ABOUTME: HTTP endpoints for LTI 1.3 login initiation and launch
// ABOUTME: Translates requests into LtiCommand values and outcomes into redirects with cookies
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::constants::defaults::{LAUNCH_PATH, LOGIN_PATH};
use crate::lti::{LaunchForm, LoginInitiationParams, LtiCommand, LtiOutcome};
use crate::security::cookies::{session_cookie, SameSite};
use crate::server::ServerResources;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use std::sync::Arc;

/// LTI routes implementation
pub struct LtiRoutes;

impl LtiRoutes {
    /// Create the login and launch routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                LOGIN_PATH,
                get(Self::handle_login_query).post(Self::handle_login_form),
            )
            .route(LAUNCH_PATH, post(Self::handle_launch))
            .with_state(resources)
    }

    async fn handle_login_query(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<LoginInitiationParams>,
    ) -> Response {
        Self::dispatch(&resources, LtiCommand::LoginInitiate(params)).await
    }

    async fn handle_login_form(
        State(resources): State<Arc<ServerResources>>,
        Form(params): Form<LoginInitiationParams>,
    ) -> Response {
        Self::dispatch(&resources, LtiCommand::LoginInitiate(params)).await
    }

    async fn handle_launch(
        State(resources): State<Arc<ServerResources>>,
        Form(form): Form<LaunchForm>,
    ) -> Response {
        Self::dispatch(&resources, LtiCommand::Launch(form)).await
    }

    async fn dispatch(resources: &ServerResources, command: LtiCommand) -> Response {
        match resources.lti.handle(command).await {
            Ok(LtiOutcome::RedirectToPlatform(url)) => {
                (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response()
            }
            Ok(LtiOutcome::SessionIssued(success)) => {
                let max_age = (success.session.expires_at - success.session.created_at).num_seconds();
                let cookie = session_cookie(
                    &success.session.token,
                    max_age,
                    SameSite::None,
                    resources.config.session.secure_cookies,
                );
                (
                    StatusCode::SEE_OTHER,
                    [
                        (header::LOCATION, success.redirect_to.to_string()),
                        (header::SET_COOKIE, cookie),
                        (header::CACHE_CONTROL, "no-store".to_owned()),
                    ],
                )
                    .into_response()
            }
            Err(e) => e.into_http_response(resources.config.lti.debug_errors),
        }
    }
}
