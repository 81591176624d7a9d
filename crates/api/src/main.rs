use std::time::Duration;

use anyhow::Result;
use tracing::info;

use eventgate_api::app::create_app;
use eventgate_api::config::Config;
use eventgate_api::jobs::{JobScheduler, PoolMetricsJob, StatsGaugesJob};
use eventgate_api::middleware::{logging, metrics};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging and the Prometheus recorder
    logging::init_logging(&config.logging);
    metrics::init_metrics();

    info!("Starting Eventgate API v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // Start background jobs
    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(
        pool.clone(),
        config.database.max_connections,
    ));
    scheduler.register(StatsGaugesJob::new(pool.clone()));
    scheduler.start();

    // Build application
    let app = create_app(config.clone(), pool);

    // Start server
    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, shutting down background jobs");
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(5)).await;

    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
