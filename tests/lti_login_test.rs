// ABOUTME: Integration tests for OIDC third-party login initiation
// ABOUTME: Exercises the service directly and the /lti/login endpoint over GET and POST
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use chrono::{Duration, Utc};
use common::{
    create_lti_harness, create_test_resources, login_params, query_param, AUTH_ENDPOINT,
    BASE_URL, CLIENT_ID, ISSUER,
};
use coursedesk_server::errors::LtiError;
use coursedesk_server::lti::{LoginInitiationParams, ReplayStore};
use coursedesk_server::server::router;
use helpers::axum_test::AxumTestRequest;
use helpers::log_capture::CapturedLogs;
use serde_json::Value;

// ============================================================================
// Service-level login initiation
// ============================================================================

#[tokio::test]
async fn test_login_redirects_to_platform_with_fresh_state() {
    let harness = create_lti_harness().await;
    let now = Utc::now();

    let redirect = harness
        .service
        .initiate_login_at(&login_params(), now)
        .await
        .unwrap();

    assert!(redirect.as_str().starts_with(AUTH_ENDPOINT));
    assert_eq!(query_param(&redirect, "scope").as_deref(), Some("openid"));
    assert_eq!(query_param(&redirect, "response_type").as_deref(), Some("id_token"));
    assert_eq!(query_param(&redirect, "response_mode").as_deref(), Some("form_post"));
    assert_eq!(query_param(&redirect, "prompt").as_deref(), Some("none"));
    assert_eq!(query_param(&redirect, "client_id").as_deref(), Some(CLIENT_ID));
    assert_eq!(
        query_param(&redirect, "redirect_uri").as_deref(),
        Some("https://tool.example.com/lti/launch")
    );
    assert_eq!(query_param(&redirect, "login_hint").as_deref(), Some("hint-42"));
    assert_eq!(query_param(&redirect, "lti_message_hint").as_deref(), Some("msg-hint"));

    let state = query_param(&redirect, "state").unwrap();
    let nonce = query_param(&redirect, "nonce").unwrap();
    assert_eq!(state.len(), 64);
    assert_eq!(nonce.len(), 64);
    assert_ne!(state, nonce);

    let stored = harness
        .database
        .consume_login_state(&state, now)
        .await
        .unwrap()
        .expect("state was not persisted");
    assert_eq!(stored.nonce, nonce);
    assert_eq!(stored.issuer, ISSUER);
    assert_eq!(stored.client_id, CLIENT_ID);
    assert_eq!(
        stored.target_link_uri.as_deref(),
        Some("https://tool.example.com/courses/101")
    );
    assert_eq!((stored.expires_at - stored.created_at).num_seconds(), 600);
    assert!(harness.database.consume_nonce(&nonce, now).await.unwrap().is_some());
}

#[tokio::test]
async fn test_each_login_mints_distinct_tokens() {
    let harness = create_lti_harness().await;
    let now = Utc::now();
    let first = harness.service.initiate_login_at(&login_params(), now).await.unwrap();
    let second = harness.service.initiate_login_at(&login_params(), now).await.unwrap();
    assert_ne!(query_param(&first, "state"), query_param(&second, "state"));
    assert_ne!(query_param(&first, "nonce"), query_param(&second, "nonce"));
}

#[tokio::test]
async fn test_login_without_client_id_uses_bare_registration() {
    let harness = create_lti_harness().await;
    let params = LoginInitiationParams {
        client_id: None,
        lti_message_hint: None,
        ..login_params()
    };
    let redirect = harness.service.initiate_login(&params).await.unwrap();
    assert_eq!(query_param(&redirect, "client_id").as_deref(), Some(CLIENT_ID));
    assert_eq!(query_param(&redirect, "lti_message_hint"), None);
}

#[tokio::test]
async fn test_login_requires_issuer_and_login_hint() {
    let harness = create_lti_harness().await;

    let no_iss = LoginInitiationParams {
        iss: None,
        ..login_params()
    };
    let err = harness.service.initiate_login(&no_iss).await.unwrap_err();
    assert!(matches!(err, LtiError::MissingParameter("iss")));

    let blank_hint = LoginInitiationParams {
        login_hint: Some("   ".to_owned()),
        ..login_params()
    };
    let err = harness.service.initiate_login(&blank_hint).await.unwrap_err();
    assert!(matches!(err, LtiError::MissingParameter("login_hint")));
}

#[tokio::test]
async fn test_login_rejects_unknown_platform_and_client() {
    let harness = create_lti_harness().await;

    let stranger = LoginInitiationParams {
        iss: Some("https://unknown-lms.example.org".to_owned()),
        ..login_params()
    };
    let err = harness.service.initiate_login(&stranger).await.unwrap_err();
    assert!(matches!(err, LtiError::UnregisteredPlatform { .. }));

    let wrong_client = LoginInitiationParams {
        client_id: Some("someone-else".to_owned()),
        ..login_params()
    };
    let err = harness.service.initiate_login(&wrong_client).await.unwrap_err();
    assert!(matches!(err, LtiError::ClientIdMismatch { .. }));
}

#[tokio::test]
async fn test_login_failures_are_logged_with_kind() {
    let harness = create_lti_harness().await;
    let (logs, _guard) = CapturedLogs::install();

    let no_iss = LoginInitiationParams {
        iss: None,
        ..login_params()
    };
    harness.service.initiate_login(&no_iss).await.unwrap_err();

    let blank_hint = LoginInitiationParams {
        login_hint: Some(String::new()),
        ..login_params()
    };
    harness.service.initiate_login(&blank_hint).await.unwrap_err();

    let output = logs.contents();
    assert_eq!(output.matches("LTI login rejected").count(), 2, "{output}");
    assert!(output.contains("MISSING_PARAMETER"), "{output}");
    assert!(output.contains("missing required parameter: iss"), "{output}");
    assert!(output.contains("missing required parameter: login_hint"), "{output}");
}

#[tokio::test]
async fn test_login_storage_failure_is_logged_as_error() {
    let harness = create_lti_harness().await;
    harness.database.pool().close().await;
    let (logs, _guard) = CapturedLogs::install();

    let err = harness.service.initiate_login(&login_params()).await.unwrap_err();
    assert!(matches!(err, LtiError::Storage(_)));

    let output = logs.contents();
    assert!(output.contains("ERROR"), "{output}");
    assert!(output.contains("LTI login failed"), "{output}");
    assert!(output.contains("STORAGE_FAILURE"), "{output}");
}

#[tokio::test]
async fn test_login_sweeps_expired_states() {
    let harness = create_lti_harness().await;
    let t0 = Utc::now();
    let first = harness.service.initiate_login_at(&login_params(), t0).await.unwrap();
    let stale_state = query_param(&first, "state").unwrap();

    let later = t0 + Duration::seconds(601);
    harness.service.initiate_login_at(&login_params(), later).await.unwrap();

    // consuming at t0 would succeed had the row survived the sweep
    assert!(harness
        .database
        .consume_login_state(&stale_state, t0)
        .await
        .unwrap()
        .is_none());
}

// ============================================================================
// GET/POST /lti/login
// ============================================================================

fn login_uri() -> String {
    let query = serde_urlencoded::to_string([
        ("iss", ISSUER),
        ("login_hint", "hint-42"),
        ("target_link_uri", "https://tool.example.com/courses/101"),
        ("client_id", CLIENT_ID),
    ])
    .unwrap();
    format!("/lti/login?{query}")
}

#[tokio::test]
async fn test_login_get_returns_found_redirect() {
    let resources = create_test_resources(false).await;
    let response = AxumTestRequest::get(&login_uri())
        .send(router(resources))
        .await;

    assert_eq!(response.status(), 302);
    let location = response.location();
    assert!(location.as_str().starts_with(AUTH_ENDPOINT));
    assert!(query_param(&location, "state").is_some());
    assert!(response.header("set-cookie").is_none());
}

#[tokio::test]
async fn test_login_post_form_returns_found_redirect() {
    let resources = create_test_resources(false).await;
    let response = AxumTestRequest::post("/lti/login")
        .form(&[
            ("iss", ISSUER),
            ("login_hint", "hint-42"),
            ("target_link_uri", "https://tool.example.com/courses/101"),
        ])
        .send(router(resources))
        .await;

    assert_eq!(response.status(), 302);
    assert_eq!(
        query_param(&response.location(), "redirect_uri").as_deref(),
        Some(format!("{BASE_URL}/lti/launch").as_str())
    );
}

#[tokio::test]
async fn test_login_failure_is_generic_without_debug() {
    let resources = create_test_resources(false).await;
    let response = AxumTestRequest::get("/lti/login?iss=https%3A%2F%2Fnobody.example&login_hint=x")
        .send(router(resources))
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "LTI_AUTHENTICATION_FAILED");
    assert!(body.get("kind").is_none());
    assert!(body.get("detail").is_none());
    assert!(!body.to_string().contains("nobody.example"));
}

#[tokio::test]
async fn test_login_failure_carries_detail_in_debug_mode() {
    let resources = create_test_resources(true).await;
    let response = AxumTestRequest::get("/lti/login?login_hint=x")
        .send(router(resources))
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["kind"], "MISSING_PARAMETER");
    assert!(body["detail"].as_str().unwrap().contains("iss"));
}
