// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides fixture keys, a static key set fetcher, id_token minting, and service wiring
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::wildcard_in_or_patterns,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::similar_names,
    clippy::uninlined_format_args,
    clippy::redundant_closure_for_method_calls
)]
//! Shared test utilities for `coursedesk_server`
//!
//! Platform-side behavior (key publication and token signing) is simulated
//! with fixed RSA keys under `tests/fixtures/lti`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use coursedesk_server::{
    config::ServerConfig,
    crypto::jwk::JsonWebKeySet,
    database::Database,
    errors::LtiError,
    lti::{
        JwksFetcher, LoginInitiationParams, LtiService, LtiSettings, PlatformRegistry,
    },
    models::PlatformConfig,
    server::ServerResources,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use url::Url;

pub const ISSUER: &str = "https://lms.example.edu";
pub const CLIENT_ID: &str = "coursedesk-tool";
pub const DEPLOYMENT_ID: &str = "deployment-1";
pub const KID_A: &str = "platform-a-2025";
pub const KID_B: &str = "platform-b-2025";
pub const BASE_URL: &str = "https://tool.example.com";
pub const AUTH_ENDPOINT: &str = "https://lms.example.edu/mod/lti/auth.php";
pub const JWKS_URI: &str = "https://lms.example.edu/mod/lti/certs.php";
pub const CONTEXT_ID: &str = "ctx-1";
pub const SUBJECT: &str = "user-42";
pub const INSTRUCTOR_ROLE: &str =
    "http://purl.imsglobal.org/vocab/lis/v2/membership#Instructor";
pub const LEARNER_ROLE: &str = "http://purl.imsglobal.org/vocab/lis/v2/membership#Learner";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Path of a file under `tests/fixtures/lti`
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("lti")
        .join(name)
}

/// Contents of a fixture file
pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|e| panic!("Failed to read fixture {name}: {e}"))
}

/// Key set published by the simulated platform (keys A and B)
pub fn platform_jwks() -> JsonWebKeySet {
    serde_json::from_str(&fixture("platform_jwks.json")).expect("Invalid JWKS fixture")
}

/// Trust entry for the simulated platform
pub fn platform_config() -> PlatformConfig {
    PlatformConfig {
        client_id: CLIENT_ID.to_owned(),
        auth_endpoint: Url::parse(AUTH_ENDPOINT).unwrap(),
        jwks_uri: Url::parse(JWKS_URI).unwrap(),
    }
}

/// Registry holding the simulated platform under its bare issuer
pub fn platform_registry() -> PlatformRegistry {
    let mut registry = PlatformRegistry::new();
    registry.register(ISSUER, platform_config()).unwrap();
    registry
}

/// Key set fetcher that serves a fixed document and counts requests
pub struct StaticJwksFetcher {
    keys: Option<JsonWebKeySet>,
    calls: AtomicUsize,
}

impl StaticJwksFetcher {
    /// Serve the fixture key set
    pub fn new() -> Self {
        Self::with_keys(platform_jwks())
    }

    /// Serve a specific key set
    pub fn with_keys(keys: JsonWebKeySet) -> Self {
        Self {
            keys: Some(keys),
            calls: AtomicUsize::new(0),
        }
    }

    /// Simulate an unreachable key set endpoint
    pub fn unreachable() -> Self {
        Self {
            keys: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JwksFetcher for StaticJwksFetcher {
    async fn fetch(&self, jwks_uri: &Url) -> Result<JsonWebKeySet, LtiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys
            .clone()
            .ok_or_else(|| LtiError::JwksFetchFailure(format!("connection refused: {jwks_uri}")))
    }
}

/// Sign `claims` as the platform would, with fixture key `platform_a` or `platform_b`
pub fn mint_token(key: &str, kid: Option<&str>, claims: &Value) -> String {
    let pem = fixture(&format!("{key}.pem"));
    let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("Invalid fixture key");
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_owned);
    jsonwebtoken::encode(&header, claims, &encoding_key).expect("Failed to sign token")
}

/// Token signed with key A and advertising its kid
pub fn mint_token_a(claims: &Value) -> String {
    mint_token("platform_a", Some(KID_A), claims)
}

/// A well-formed LTI 1.3 resource link launch for `nonce`, issued at `now`
pub fn launch_claims(nonce: &str, now: DateTime<Utc>) -> Value {
    json!({
        "iss": ISSUER,
        "sub": SUBJECT,
        "aud": CLIENT_ID,
        "exp": (now + Duration::minutes(5)).timestamp(),
        "iat": now.timestamp(),
        "nonce": nonce,
        "name": "Ada Lovelace",
        "email": "ada@example.edu",
        "https://purl.imsglobal.org/spec/lti/claim/version": "1.3.0",
        "https://purl.imsglobal.org/spec/lti/claim/message_type": "LtiResourceLinkRequest",
        "https://purl.imsglobal.org/spec/lti/claim/deployment_id": DEPLOYMENT_ID,
        "https://purl.imsglobal.org/spec/lti/claim/target_link_uri": format!("{BASE_URL}/courses/101"),
        "https://purl.imsglobal.org/spec/lti/claim/context": {
            "id": CONTEXT_ID,
            "title": "Course",
            "label": "AE101"
        },
        "https://purl.imsglobal.org/spec/lti/claim/roles": [INSTRUCTOR_ROLE]
    })
}

/// Handshake settings rooted at [`BASE_URL`]
pub fn test_settings() -> LtiSettings {
    let base_url = Url::parse(BASE_URL).unwrap();
    LtiSettings {
        launch_url: base_url.join("/lti/launch").unwrap(),
        landing_url: base_url.join("/").unwrap(),
        base_url,
        login_state_ttl: Duration::seconds(600),
        clock_skew_secs: 30,
        session_ttl: Duration::hours(8),
    }
}

/// Standard test database setup
pub async fn create_test_database() -> Database {
    init_test_logging();
    Database::new("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database")
}

/// Service wired to an in-memory database and a static key set
pub struct LtiHarness {
    pub service: LtiService,
    pub database: Database,
    pub jwks: Arc<StaticJwksFetcher>,
}

/// Build a harness serving the fixture key set
pub async fn create_lti_harness() -> LtiHarness {
    create_lti_harness_with(StaticJwksFetcher::new()).await
}

/// Build a harness with a specific fetcher
pub async fn create_lti_harness_with(fetcher: StaticJwksFetcher) -> LtiHarness {
    let database = create_test_database().await;
    let jwks = Arc::new(fetcher);
    let store = Arc::new(database.clone());
    let service = LtiService::new(
        Arc::new(platform_registry()),
        store.clone(),
        jwks.clone(),
        store,
        test_settings(),
    );
    LtiHarness {
        service,
        database,
        jwks,
    }
}

/// Login parameters as the platform sends them
pub fn login_params() -> LoginInitiationParams {
    LoginInitiationParams {
        iss: Some(ISSUER.to_owned()),
        login_hint: Some("hint-42".to_owned()),
        target_link_uri: Some(format!("{BASE_URL}/courses/101")),
        lti_message_hint: Some("msg-hint".to_owned()),
        client_id: Some(CLIENT_ID.to_owned()),
    }
}

/// Single query parameter of a URL
pub fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Run a login at `now` and return the minted `(state, nonce)`
pub async fn login_at(service: &LtiService, now: DateTime<Utc>) -> (String, String) {
    let redirect = service
        .initiate_login_at(&login_params(), now)
        .await
        .expect("login initiation failed");
    (
        query_param(&redirect, "state").expect("state missing"),
        query_param(&redirect, "nonce").expect("nonce missing"),
    )
}

/// Full server resources over an in-memory database
pub async fn create_test_resources(debug_errors: bool) -> Arc<ServerResources> {
    let database = create_test_database().await;
    let mut config = ServerConfig::with_base_url(Url::parse(BASE_URL).unwrap());
    config.database_url = "sqlite::memory:".to_owned();
    config.lti.debug_errors = debug_errors;
    Arc::new(
        ServerResources::new(
            config,
            database,
            platform_registry(),
            Arc::new(StaticJwksFetcher::new()),
        )
        .expect("Failed to wire server resources"),
    )
}
