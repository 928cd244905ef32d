// ABOUTME: Loads the LTI platform registry from a JSON file or an inline environment variable
// ABOUTME: LTI_PLATFORMS_FILE takes precedence over LTI_PLATFORMS; neither set yields an empty registry
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::lti::PlatformRegistry;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use tracing::{info, warn};

/// Env var naming a JSON registry file
pub const PLATFORMS_FILE_ENV: &str = "LTI_PLATFORMS_FILE";
/// Env var holding an inline JSON registry
pub const PLATFORMS_INLINE_ENV: &str = "LTI_PLATFORMS";

/// Read a registry document from disk
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed
pub fn load_registry_file(path: &Path) -> Result<PlatformRegistry> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read platform registry {}", path.display()))?;
    PlatformRegistry::from_json(&json)
        .with_context(|| format!("Invalid platform registry {}", path.display()))
}

/// Build the registry from the environment
///
/// # Errors
///
/// Returns an error if a configured source cannot be read or parsed
pub fn load_registry_from_env() -> Result<PlatformRegistry> {
    let registry = if let Ok(path) = env::var(PLATFORMS_FILE_ENV) {
        load_registry_file(Path::new(&path))?
    } else if let Ok(json) = env::var(PLATFORMS_INLINE_ENV) {
        PlatformRegistry::from_json(&json)
            .with_context(|| format!("Invalid {PLATFORMS_INLINE_ENV} value"))?
    } else {
        PlatformRegistry::new()
    };

    if registry.is_empty() {
        warn!("No LTI platforms registered; every login will be rejected");
    } else {
        info!(platforms = registry.len(), "LTI platform registry loaded");
    }
    Ok(registry)
}
