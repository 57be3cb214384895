//! HTTP server command

use crate::api::{router, AppState};
use crate::config::Config;
use crate::database::DatabasePool;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Handle the serve command
pub async fn handle_serve(config_path: Option<&Path>, bind_override: Option<SocketAddr>) -> Result<()> {
    let mut config = Config::load(config_path).context("Failed to load configuration")?;
    if let Some(bind) = bind_override {
        config.server.bind = bind;
    }
    config.validate().context("Invalid configuration")?;

    let pool = DatabasePool::from_config(&config.database)
        .await
        .context("Failed to create database pool")?;

    let listener = TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(AppState::new(pool)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
