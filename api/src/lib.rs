//! Faultline API Server
//!
//! This crate provides the HTTP server that ingests error reports. Services
//! POST a JSON report to `/`; each valid report is written to InfluxDB as one
//! `error_logs` point tagged with the reporting service and endpoint.
//!
//! # Architecture
//!
//! The API server is built on Axum and Tokio:
//! - A single ingestion route validating and storing error reports
//! - Per-request correlation IDs threaded through a [`RequestContext`]
//! - An InfluxDB v2 point store whose organization is resolved at startup
//!
//! # Example
//!
//! ```no_run
//! use api::run_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod context;
mod routes;
mod state;

pub use config::{Config, ConfigError, InfluxConfig};
pub use context::{request_context, RequestContext, REQUEST_ID_HEADER};
pub use routes::{IngestError, INGEST_OK_MESSAGE};
pub use state::AppState;

use anyhow::{Context, Result};
use axum::{middleware, Router};
use shared::storage::{InfluxClient, InfluxPointStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Runs the Faultline API server.
///
/// This function initializes the server with configuration from environment variables
/// and starts listening for incoming connections. It handles graceful shutdown on
/// SIGTERM/SIGINT signals.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The InfluxDB organization cannot be resolved
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server() -> Result<()> {
    let config = Config::from_env()?;
    run_server_with_config(config).await
}

/// Runs the Faultline API server with the provided configuration.
///
/// The organization is resolved before the listener is bound, so a server
/// that cannot reach its organization never accepts traffic.
///
/// # Errors
///
/// Returns an error if:
/// - The InfluxDB organization cannot be resolved
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server_with_config(config: Config) -> Result<()> {
    tracing::info!(
        host = %config.host,
        port = %config.port,
        influx_url = %config.influx.url,
        bucket = %config.influx.bucket,
        "Faultline API server starting"
    );

    let state = build_state(&config).await?;

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(%addr, "Listening for connections");

    serve(listener, state).await
}

/// Connects to InfluxDB and builds the application state.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the configured
/// organization cannot be found.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let influx = &config.influx;
    let client = InfluxClient::new(&influx.url, &influx.token, influx.timeout)?;

    if let Err(e) = client.ping().await {
        tracing::warn!(error = %e, url = %influx.url, "InfluxDB health check failed");
    }

    let organization = client
        .find_organization_by_name(&influx.org)
        .await
        .with_context(|| {
            format!(
                "Cannot start server without access to InfluxDB organization {:?}",
                influx.org
            )
        })?;

    tracing::info!(
        org = %organization.name,
        org_id = %organization.id,
        "Organization found"
    );

    let store = InfluxPointStore::new(client, &organization, &influx.bucket);
    Ok(AppState::new(Arc::new(store), organization).with_max_body_bytes(config.max_body_bytes))
}

/// Serves the application on an already bound listener until shutdown.
///
/// # Errors
///
/// Returns an error if the server fails while running.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Creates the main application router with all routes and middleware.
///
/// This function is public to allow testing the router without starting a full server.
pub fn create_router(state: AppState) -> Router {
    routes::ingest_routes(state)
        .layer(middleware::from_fn(request_context))
        .layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
