// ABOUTME: Shared server resources, router assembly, and the HTTP serve loop
// ABOUTME: Applies request tracing, request ids, and body limits around every route
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::config::ServerConfig;
use crate::database::Database;
use crate::lti::{JwksFetcher, LtiService, LtiSettings, PlatformRegistry};
use crate::routes::{HealthRoutes, LtiRoutes, SessionRoutes};
use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Largest accepted request body; id_tokens are a few KiB
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// State shared by every handler
#[derive(Debug)]
pub struct ServerResources {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    /// Persistence
    pub database: Database,
    /// LTI handshake service
    pub lti: LtiService,
}

impl ServerResources {
    /// Wire resources, using the database as replay and launch store
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URLs cannot be combined
    pub fn new(
        config: ServerConfig,
        database: Database,
        registry: PlatformRegistry,
        jwks: Arc<dyn JwksFetcher>,
    ) -> Result<Self> {
        let settings = LtiSettings::from_config(&config).context("Invalid LTI URL settings")?;
        let store = Arc::new(database.clone());
        let lti = LtiService::new(
            Arc::new(registry),
            store.clone(),
            jwks,
            store,
            settings,
        );
        Ok(Self {
            config: Arc::new(config),
            database,
            lti,
        })
    }
}

/// Assemble the application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(LtiRoutes::routes(resources.clone()))
        .merge(SessionRoutes::routes(resources))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES)),
        )
}

/// Serve until Ctrl-C
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails
pub async fn run(resources: Arc<ServerResources>) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], resources.config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router(resources))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
