// ABOUTME: Core types and constants for the Coursedesk LTI launch service
// ABOUTME: Foundation crate with error taxonomy, LTI claim constants, and domain models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Coursedesk Core
//!
//! Foundation crate providing shared types and constants for the Coursedesk
//! LTI 1.3 launch service. This crate is designed to change infrequently,
//! enabling incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: `LtiError` launch taxonomy, `DatabaseError`, and the HTTP-facing `AppError`
//! - **constants**: LTI claim URIs, cookie names, and protocol defaults
//! - **models**: Platform trust entries, anti-replay records, roles, and sessions

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (`PlatformConfig`, `LoginState`, `Role`, `Session`, ...)
pub mod models;
