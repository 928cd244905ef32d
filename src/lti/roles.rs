// ABOUTME: Maps LTI role URIs onto the two course roles this service distinguishes
// ABOUTME: Instructor and teaching-assistant roles elevate; everything else is a student
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::constants::lti::INSTRUCTOR_ROLE_FRAGMENTS;
use crate::models::Role;

/// Derive the course role from the launch's role URIs
#[must_use]
pub fn derive_role<S: AsRef<str>>(roles: &[S]) -> Role {
    let elevated = roles.iter().any(|role| {
        INSTRUCTOR_ROLE_FRAGMENTS
            .iter()
            .any(|fragment| role.as_ref().contains(fragment))
    });
    if elevated {
        Role::Instructor
    } else {
        Role::Student
    }
}
