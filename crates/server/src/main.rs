//! swcache-mcp server entry point.
//!
//! Boots the offline cache worker, installs it, and serves its control
//! surface as an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig, NotificationTemplate, ServiceWorker};
use swcache_core::{AppConfig, cache::open_storage};
use tracing_subscriber::EnvFilter;

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
    tracing::info!(
        origin = %config.origin,
        version = %config.cache_version,
        storage = ?config.storage,
        "Starting swcache-mcp server on stdio transport"
    );

    let storage = open_storage(&config).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from_app(&config))?);
    let worker = Arc::new(ServiceWorker::new(&config, storage, network)?);

    let report = worker.install().await?;
    if !report.failed.is_empty() {
        tracing::warn!(failed = report.failed.len(), "installed with missing precache entries");
    }

    let handler = handler::SwCacheServer::new(worker, NotificationTemplate::from_config(&config));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
