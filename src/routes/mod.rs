// ABOUTME: Route module organization for the HTTP surface
// ABOUTME: One router struct per domain, merged by the server
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Route modules
//!
//! - `lti` - login initiation and launch endpoints
//! - `session` - session introspection and logout
//! - `health` - liveness and readiness

/// Health check routes
pub mod health;
/// LTI login and launch routes
pub mod lti;
/// Session routes
pub mod session;

pub use health::HealthRoutes;
pub use lti::LtiRoutes;
pub use session::SessionRoutes;
