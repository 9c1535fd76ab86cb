use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobrunner_service::api;
use jobrunner_service::config::Config;
use jobrunner_service::context::ServiceContext;
use jobrunner_service::dispatch::Dispatcher;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobrunner_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Jobrunner Service");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: database_file={}, max_workers={}, max_retries={}",
        config.database_file, config.max_workers, config.max_retries
    );

    let bind_addr = config.bind_addr.clone();

    // Initialize shared context (store, recovery, executors, worker pool)
    let ctx = Arc::new(ServiceContext::init(config).await?);

    // Start the dispatcher
    let dispatcher = Dispatcher::new(Arc::clone(&ctx));
    let dispatcher_handle = tokio::spawn(dispatcher.run());

    // Build router with all API endpoints
    let app = api::create_router(Arc::clone(&ctx));

    info!("Listening on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let running jobs finish before closing the store
    info!("Shutting down");
    ctx.begin_shutdown();
    let _ = dispatcher_handle.await;
    ctx.shutdown().await;

    Ok(())
}

/// Loads configuration from environment variables and validates it
fn load_config() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}

/// Resolves when Ctrl-C is received
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
