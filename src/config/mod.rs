// ABOUTME: Configuration loading for the server
// ABOUTME: Environment-driven server settings and the LTI platform registry source
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Server settings from environment variables
pub mod environment;
/// Platform registry loading
pub mod platforms;

pub use environment::{Environment, LtiConfig, ServerConfig, SessionConfig};
