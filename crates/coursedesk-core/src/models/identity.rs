// ABOUTME: User, course, and enrollment records created or refreshed by a launch
// ABOUTME: Upsert inputs are derived from verified claims; rows are keyed per issuer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::session::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User profile taken from verified launch claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Platform issuer
    pub issuer: String,
    /// Platform-scoped subject (`sub`)
    pub subject: String,
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: Option<String>,
}

/// Course context taken from verified launch claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseContext {
    /// Platform issuer
    pub issuer: String,
    /// Platform context id
    pub context_id: String,
    /// Course title
    pub title: Option<String>,
    /// Course short label
    pub label: Option<String>,
}

/// Stored user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Internal id
    pub id: Uuid,
    /// Platform issuer
    pub issuer: String,
    /// Platform subject
    pub subject: String,
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// First launch
    pub created_at: DateTime<Utc>,
    /// Most recent launch
    pub updated_at: DateTime<Utc>,
}

/// Stored course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    /// Internal id
    pub id: Uuid,
    /// Platform issuer
    pub issuer: String,
    /// Platform context id
    pub context_id: String,
    /// Course title
    pub title: Option<String>,
    /// Course short label
    pub label: Option<String>,
    /// First launch
    pub created_at: DateTime<Utc>,
    /// Most recent launch
    pub updated_at: DateTime<Utc>,
}

/// Stored enrollment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    /// Enrolled user
    pub user_id: Uuid,
    /// Course
    pub course_id: Uuid,
    /// Role derived on the most recent launch
    pub role: Role,
    /// Most recent launch
    pub last_seen_at: DateTime<Utc>,
}
