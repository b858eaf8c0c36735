//! Payroll Engine API Server
//!
//! Loads configuration, seeds salary structures and serves the HTTP API.
//! Audit entries go to the tracing output.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payroll_engine::api::{AppState, create_router};
use payroll_engine::audit::TracingAuditRecorder;
use payroll_engine::config::ConfigLoader;
use payroll_engine::engine::PayrollEngine;

const DEFAULT_CONFIG_DIR: &str = "./config/default";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payroll_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_dir =
        std::env::var("PAYROLL_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let loader = ConfigLoader::load(&config_dir)?;
    info!(config_dir = %config_dir, "Configuration loaded");

    let engine = PayrollEngine::in_memory(Arc::new(TracingAuditRecorder))
        .with_parallel_threshold(loader.config().engine.parallel_threshold);

    // Finds nothing on a fresh in-memory store. Runs only survive a restart
    // once the engine is built over a persistent repository.
    let recovered = engine.recover_interrupted_runs()?;
    if !recovered.is_empty() {
        warn!(count = recovered.len(), "Closed interrupted payroll runs");
    }
    loader.seed(&engine)?;

    let app = create_router(AppState::new(engine));

    let addr = loader.config().server.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
