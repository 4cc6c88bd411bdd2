use std::sync::Arc;
use std::time::Duration;

use alumni_events_api::{
    app::{create_app, AppState},
    config::Config,
    jobs::{JobScheduler, PoolMetricsJob, StoreHealthJob},
    middleware::{init_metrics, logging::init_logging},
    shutdown::shutdown_signal,
};
use anyhow::{Context, Result};
use domain::store::EventStore;
use persistence::PgEventStore;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_logging(&config.logging)?;
    init_metrics()?;

    info!("Starting alumni events API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.pool_config())
        .await
        .context("Failed to connect to database")?;
    persistence::db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let store: Arc<dyn EventStore> = Arc::new(PgEventStore::new(pool.clone()));

    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(pool));
    scheduler.register(StoreHealthJob::new(store.clone()));
    scheduler.start();

    let addr = config.socket_addr().context("Invalid server address")?;
    let state = AppState::new(config, store).context("Invalid JWT configuration")?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");
    Ok(())
}
