//! # Condo Worker
//!
//! Periodic maintenance for the condominium backend:
//! - Issues the monthly expensa of every active contract with a quota
//! - Reconciles unit occupancy with active contracts
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p condo-worker
//! ```

use condo_shared::db::pool;
use condo_shared::vendors::FcmClient;
use condo_worker::config::WorkerConfig;
use condo_worker::scheduler::Scheduler;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "condo_worker=debug,condo_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Condo Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env()?;
    let db = pool::create_pool(config.database.clone()).await?;
    let push = Arc::new(FcmClient::new(&config.vendors));

    let scheduler = Scheduler::new(db.clone(), push, &config);
    let shutdown = scheduler.shutdown_token();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        shutdown.cancel();
    });

    scheduler.run().await;

    pool::close_pool(db).await;
    tracing::info!("Worker stopped");

    Ok(())
}
