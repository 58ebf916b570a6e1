//! pantry-worker entry point.
//!
//! Opens the cache, starts the worker and serves its events as MCP tools on
//! stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use pantry_client::{FetchConfig, HttpTransport, Worker};
use pantry_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(db_path = %config.db_path.display(), origin = %config.origin, "starting pantry worker on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let transport = HttpTransport::new(FetchConfig::from_app_config(&config)?)?;
    let worker = Arc::new(Worker::new(&config, db.clone(), Arc::new(transport)).await?);

    // A failed install leaves the previous version in control; keep serving.
    if let Err(e) = worker.start().await {
        tracing::warn!(error = %e, "worker did not activate at startup");
    }

    let handler = handler::PantryServer::new(worker.clone());
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    let pending = worker.background().pending().await;
    if pending > 0 {
        tracing::info!(pending, "waiting for background cache writes");
    }
    worker.background().drain().await;
    db.close().await?;

    Ok(())
}
