// ABOUTME: HTTP-facing security helpers
// ABOUTME: Session cookie formatting and parsing
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Session cookie helpers
pub mod cookies;
