//! swcache server entry point.
//!
//! This is the main binary that boots the offline cache worker and serves it
//! as an MCP server on stdio transport. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{CacheManager, FetchClient, FetchConfig, LocalHost, WorkerConfig, WorkerRuntime};
use swcache_core::{AppConfig, CacheDb};
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

    let config = AppConfig::load().context("failed to load configuration")?;
    let worker_config = WorkerConfig::from_app(&config).context("invalid worker configuration")?;

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache database at {}", config.db_path.display()))?;

    let fetcher = FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.timeout(),
        origin: Some(worker_config.origin.clone()),
        ..Default::default()
    })?;

    tracing::info!(
        store = %worker_config.store_name,
        origin = %worker_config.origin,
        manifest = worker_config.manifest.len(),
        "Starting swcache server on stdio transport"
    );

    let runtime = WorkerRuntime::new(CacheManager::new(worker_config, db, fetcher), Arc::new(LocalHost::new()));
    let handler = handler::SwCacheServer::new(Arc::new(runtime));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
