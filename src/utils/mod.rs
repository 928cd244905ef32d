// ABOUTME: Shared utilities used across request handling
// ABOUTME: Currently holds outbound HTTP client construction
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Outbound HTTP clients
pub mod http_client;
