// ABOUTME: Course roles and the session artifact handed to downstream handlers
// ABOUTME: Only (user_id, course_id, role) crosses the boundary; raw LTI claims never do
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Course role; other LTI roles collapse to `Student`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructor or teaching assistant
    Instructor,
    /// Everyone else
    Student,
}

impl Role {
    /// Storage representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Instructor => "instructor",
            Self::Student => "student",
        }
    }

    /// Parse the storage representation
    #[must_use]
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "instructor" => Some(Self::Instructor),
            "student" => Some(Self::Student),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Newly issued session; `token` is the raw cookie value and is never stored
#[derive(Debug, Clone)]
pub struct Session {
    /// Raw session token
    pub token: String,
    /// Authenticated user
    pub user_id: Uuid,
    /// Course the session is scoped to
    pub course_id: Uuid,
    /// Role within that course
    pub role: Role,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Expiry time
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Identity triple exposed to downstream handlers
    #[must_use]
    pub const fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            user_id: self.user_id,
            course_id: self.course_id,
            role: self.role,
            expires_at: self.expires_at,
        }
    }
}

/// What downstream handlers receive for an authenticated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Authenticated user
    pub user_id: Uuid,
    /// Course the session is scoped to
    pub course_id: Uuid,
    /// Role within that course
    pub role: Role,
    /// Expiry time
    pub expires_at: DateTime<Utc>,
}
