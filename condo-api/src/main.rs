//! # Condominium API Server
//!
//! REST backend for residential condominium management: residents and
//! staff, units, common-area reservations, finances, payments and the
//! security desk (plate and face recognition).
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/condominio cargo run -p condo-api
//! ```

use condo_api::{
    app::{build_router, AppState},
    config::Config,
};
use condo_shared::db::{migrations::run_migrations, pool};
use condo_shared::vendors::Vendors;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "condo_api=debug,condo_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Condominium API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let db = pool::create_pool(config.database.clone()).await?;
    if config.run_migrations {
        run_migrations(&db).await?;
    }

    let vendors = Vendors::from_config(&config.vendors);
    let bind_address = config.bind_address();

    let state = AppState::new(db.clone(), config, vendors);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, closing database pool...");
    pool::close_pool(db).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
