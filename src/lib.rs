// ABOUTME: Main library entry point for the Coursedesk server
// ABOUTME: LTI 1.3 launch authentication that turns a signed platform launch into a course session
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![deny(unsafe_code)]

//! # Coursedesk Server
//!
//! Course discussion service entered from a learning management system via
//! LTI 1.3. This crate implements the tool side of the launch: OIDC login
//! initiation, id_token verification against the platform's published keys,
//! identity upserts, and session issuance.
//!
//! ## Architecture
//!
//! - **`lti`**: the handshake, with injected registry, replay store, key fetcher
//! - **`crypto`**: JWK to PEM conversion and token helpers
//! - **`database`**: SQLite persistence
//! - **`routes`**: axum routers per domain
//! - **`server`**: resource wiring and the serve loop

/// Configuration loading
pub mod config;

/// Key reconstruction and token helpers
pub mod crypto;

/// SQLite persistence
pub mod database;

/// Logging setup
pub mod logging;

/// LTI 1.3 login and launch
pub mod lti;

/// Request authentication extractors
pub mod middleware;

/// HTTP routes
pub mod routes;

/// Cookie helpers
pub mod security;

/// Server wiring
pub mod server;

/// Shared utilities
pub mod utils;

pub use coursedesk_core::{constants, errors, models};
