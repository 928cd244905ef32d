// ABOUTME: Core data models shared by the launch pipeline, persistence, and route layers
// ABOUTME: Platform trust entries, anti-replay records, identity rows, roles, and sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Users, courses, and enrollments created by launches
pub mod identity;
/// Platform trust entries
pub mod platform;
/// Login state and nonce records
pub mod replay;
/// Roles and sessions
pub mod session;

pub use identity::{CourseContext, CourseRecord, EnrollmentRecord, UserProfile, UserRecord};
pub use platform::PlatformConfig;
pub use replay::{LoginState, NonceRecord};
pub use session::{Role, Session, SessionIdentity};
