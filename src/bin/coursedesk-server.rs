// ABOUTME: Server binary: loads configuration, opens the database, and serves the LTI endpoints
// ABOUTME: All settings come from the environment; the HTTP port can be overridden on the command line
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Coursedesk Server Binary

use anyhow::{Context, Result};
use clap::Parser;
use coursedesk_server::{
    config::{environment::ServerConfig, platforms},
    database::Database,
    logging,
    lti::HttpJwksFetcher,
    server::{self, ServerResources},
    utils::http_client::JwksClientSettings,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "coursedesk-server")]
#[command(about = "Coursedesk - course discussion service with LTI 1.3 launch")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

/// Create the parent directory of a file-backed SQLite URL
fn ensure_database_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = path.trim_start_matches("//");
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.contains(":memory:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    info!("{}", config.summary());

    ensure_database_dir(&config.database_url)?;
    let database = Database::new(&config.database_url)
        .await
        .context("Failed to open database")?;

    let registry = platforms::load_registry_from_env()?;

    let jwks = HttpJwksFetcher::new(
        JwksClientSettings {
            timeout: Duration::from_secs(config.lti.jwks_timeout_secs),
            ..JwksClientSettings::default()
        },
        config.lti.allow_insecure_jwks,
    )
    .context("Failed to build JWKS client")?;

    let resources = Arc::new(ServerResources::new(
        config,
        database,
        registry,
        Arc::new(jwks),
    )?);

    server::run(resources).await
}
