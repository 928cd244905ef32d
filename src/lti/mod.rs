// ABOUTME: LTI 1.3 tool-side handshake: login initiation and id_token launch verification
// ABOUTME: Exposes the service, its injected collaborator traits, and the verification building blocks
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # LTI 1.3
//!
//! A launch is two browser round trips. The platform first calls the login
//! endpoint; we mint a `state` and `nonce` and bounce the browser to the
//! platform's authorization endpoint. The platform then form-posts a signed
//! `id_token` with the `state` to the launch endpoint, where it is verified
//! gate by gate before a session is issued.

/// id_token claim model and checks
pub mod claims;
/// Platform key set retrieval and key selection
pub mod jwks;
/// Compact JWS parsing and RS256 verification
pub mod jwt;
/// Launch verification gates
pub mod launch;
/// Login initiation
pub mod login;
/// Trust anchor registry
pub mod registry;
/// Anti-replay token storage
pub mod replay;
/// Role derivation
pub mod roles;
/// Service wiring and command dispatch
pub mod service;

pub use jwks::{HttpJwksFetcher, JwksFetcher};
pub use launch::{LaunchForm, LaunchIds, LaunchRecord, LaunchStore, LaunchSuccess};
pub use login::LoginInitiationParams;
pub use registry::{PlatformRegistry, RegistryError};
pub use replay::{InMemoryReplayStore, ReplayStore};
pub use service::{LtiCommand, LtiOutcome, LtiService, LtiSettings};
