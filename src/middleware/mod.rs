// ABOUTME: Request-level authentication plumbing shared by route handlers
// ABOUTME: Resolves the session cookie into the identity downstream handlers consume
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Session cookie authentication extractor
pub mod session;

pub use session::AuthenticatedSession;
