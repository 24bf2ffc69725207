use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use domain::services::lifecycle::ReservationEngine;
use persistence::repositories::{ReservationRepository, ResourceRepository};
use reservia_api::jobs::{ExpireReservationsJob, JobScheduler};
use reservia_api::{app, config, middleware, services};
use shared::token::TokenSigner;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging and metrics
    middleware::logging::init_logging(&config.logging);
    middleware::metrics::init_metrics();

    info!("Starting Reservia API v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let pool = config.database.pool_config().connect().await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // Create the initial admin account if configured
    services::admin_bootstrap::bootstrap_admin(&pool, &config.admin).await?;

    // Wire up the lifecycle engine against the record store
    let store = Arc::new(ReservationRepository::new(pool.clone()));
    let catalog = Arc::new(ResourceRepository::new(pool.clone()));
    let engine = Arc::new(ReservationEngine::new(
        store,
        catalog,
        config.reservations.lifecycle_config(),
    ));

    let token_signer = TokenSigner::new(
        &config.auth.private_key,
        &config.auth.public_key,
        config.auth.access_token_expiry_secs,
        config.auth.leeway_secs,
    )
    .map_err(|e| anyhow::anyhow!("Invalid JWT keys: {}", e))?;

    // Start the expiration sweeper
    let mut scheduler = JobScheduler::new();
    scheduler.spawn(ExpireReservationsJob::new(
        engine.clone(),
        config.reservations.sweep_interval_secs,
    ));

    // Build application
    let addr = config.socket_addr();
    let app = app::create_app(config, pool, engine, token_signer);

    // Start server
    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the sweeper before exiting
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
