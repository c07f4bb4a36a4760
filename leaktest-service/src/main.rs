//! LeakTest service binary
//!
//! Loads configuration, wires the handler onto the store, and serves
//! every RPC operation until interrupted.

use anyhow::Result;
use leaktest_service::config::ServiceConfig;
use leaktest_service::handler::LeakTestHandler;
use leaktest_service::memory_store::MemoryTimeSeriesClient;
use leaktest_service::messaging::spawn_consumers;
use leaktest_service::repository::LeakTestRepository;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting leaktest-service v{}", leaktest_service::VERSION);

    let config = Arc::new(ServiceConfig::load()?);
    info!("Loaded configuration: {:?}", config);

    let client = Arc::new(MemoryTimeSeriesClient::new());
    let repository = Arc::new(LeakTestRepository::new(client, config.store.write_precision));
    let handler = Arc::new(LeakTestHandler::new(repository));

    let shutdown = CancellationToken::new();
    let handles = spawn_consumers(&config, handler, shutdown.clone()).await?;
    info!("All {} consumers listening", handles.len());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    shutdown.cancel();

    for handle in handles {
        if let Err(join_error) = handle.await {
            error!("Consumer task failed to stop cleanly: {}", join_error);
        }
    }

    info!("Service stopped");
    Ok(())
}
