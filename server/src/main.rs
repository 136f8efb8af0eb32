//! Projects HTTP service
//!
//! Serves project records from MongoDB, a JSON file, or memory, fronted by
//! an in-process cache, and reveals records through `/br/:key` only to
//! requesters from the record's region.
//!
//! Usage:
//!   projects-server --port 3000 --mongodb-uri mongodb://localhost:27017
//!
//! The server always starts, even when the database is unreachable; it then
//! serves from its cache and keeps writes in memory.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use projects_geo::IpApiLookup;
use projects_server::{build_router, AppState, ServerConfig};
use projects_store::{CachedStore, JsonFileStore, MemoryStore, MongoStore, RecordStore};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Projects server starting...");
    let store = Arc::new(CachedStore::from_boxed(open_backend(&config).await));
    store.seed().await;

    let geo = IpApiLookup::new(config.geo_config()).context("Invalid geolocation settings")?;
    let state = AppState {
        store: store.clone(),
        geo: Arc::new(geo),
        welcome_url: config.welcome_url(),
    };

    let listener = tokio::net::TcpListener::bind((config.bind, config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.bind, config.port))?;
    info!(
        "HTTP API listening on {}:{} (store: {})",
        config.bind,
        config.port,
        store.backend_name()
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Closing store connections");
    store.close().await;
    info!("Projects server stopped");
    Ok(())
}

/// Picks the durable backend. Misconfiguration degrades to the next option
/// instead of aborting startup.
async fn open_backend(config: &ServerConfig) -> Box<dyn RecordStore> {
    match config.mongo_config() {
        Ok(Some(mongo)) => match MongoStore::connect(&mongo).await {
            Ok(store) => return Box::new(store),
            Err(e) => error!("MongoDB unavailable, continuing without it: {e}"),
        },
        Ok(None) => {}
        Err(e) => error!("Invalid database settings, continuing without MongoDB: {e}"),
    }

    if let Some(path) = &config.data_file {
        info!("Storing projects in {}", path.display());
        return Box::new(JsonFileStore::new(path));
    }

    warn!("No database configured: projects live in memory only and are lost on exit");
    Box::new(MemoryStore::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
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
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
