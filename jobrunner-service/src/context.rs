//! Service context
//!
//! Owns every long-lived resource of the service: configuration, the
//! store pool, the executor registry, the worker pool, and the
//! dispatcher wakeup channel. Built once at startup and handed around
//! behind an Arc, so nothing lives in global state.

use anyhow::Context as _;
use sqlx::sqlite::SqlitePool;
use tokio::sync::{Notify, watch};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::executor::ExecutorRegistry;
use crate::store::job_store;
use crate::worker::WorkerPool;

/// Shared state for every component of the service
pub struct ServiceContext {
    pub config: Config,
    pub pool: SqlitePool,
    pub executors: ExecutorRegistry,
    pub workers: WorkerPool,
    /// Wakes the dispatcher when new work may be available
    pub queue_notify: Notify,
    shutdown_tx: watch::Sender<bool>,
}

impl ServiceContext {
    /// Initializes the service context
    ///
    /// Opens the store, runs migrations, recovers jobs left Running by
    /// a previous process, and builds the executor registry and the
    /// worker pool.
    pub async fn init(config: Config) -> anyhow::Result<Self> {
        let pool = db::create_pool(&config.database_file)
            .await
            .with_context(|| format!("Failed to open job store at {}", config.database_file))?;

        db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        let (requeued, failed) = job_store::recover_interrupted(&pool, config.max_retries)
            .await
            .context("Failed to recover interrupted jobs")?;

        if requeued > 0 || failed > 0 {
            info!(
                "Recovered jobs interrupted by previous shutdown: {} re-queued, {} failed",
                requeued, failed
            );
        }

        let executors = ExecutorRegistry::with_builtins();
        info!("Registered payload executors: {}", executors.kinds().join(", "));

        let workers = WorkerPool::new(config.max_workers);
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            pool,
            executors,
            workers,
            queue_notify: Notify::new(),
            shutdown_tx,
        })
    }

    /// Returns a receiver that flips to true when shutdown begins
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Signals the dispatcher to stop picking up new work
    pub fn begin_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Tears the context down
    ///
    /// Waits for jobs already running to finish, then closes the pool.
    pub async fn shutdown(&self) {
        self.begin_shutdown();

        let running = self.workers.running_jobs();
        if !running.is_empty() {
            info!("Waiting for {} running job(s) to finish", running.len());
        }

        self.workers.wait_idle().await;
        self.pool.close().await;
        info!("Service context shut down");
    }
}
