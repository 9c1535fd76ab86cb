//! Service configuration
//!
//! Defines all configurable parameters for the jobrunner service including
//! the store location, worker pool sizing, retry policy, and timeouts.

use std::time::Duration;

use anyhow::Context;

/// Service configuration
///
/// All limits and intervals are configurable to allow tuning for
/// different deployment scenarios (dev vs prod, fast vs slow payloads).
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite job store, or ":memory:" for an ephemeral store
    pub database_file: String,

    /// Address the HTTP API binds to (e.g., "0.0.0.0:8080")
    pub bind_addr: String,

    /// Maximum number of jobs executing concurrently
    pub max_workers: usize,

    /// How many times a failed job is re-queued before it fails for good
    pub max_retries: u32,

    /// Default time a job can run before timing out
    pub job_timeout: Duration,

    /// How often the dispatcher re-scans the queue when idle
    pub poll_interval: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            database_file: "jobrunner.sqlite".to_string(),
            bind_addr: "0.0.0.0:8080".to_string(),
            max_workers: 4,
            max_retries: 2,
            job_timeout: Duration::from_secs(300), // 5 minutes
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - DATABASE_FILE (optional, default: "jobrunner.sqlite")
    /// - BIND_ADDR (optional, default: "0.0.0.0:8080")
    /// - MAX_WORKERS (optional, default: 4)
    /// - MAX_RETRIES (optional, default: 2)
    /// - JOB_TIMEOUT (optional, seconds, default: 300)
    /// - JOB_LOOP_INTERVAL (optional, seconds, default: 1)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::new();

        let database_file =
            std::env::var("DATABASE_FILE").unwrap_or(defaults.database_file);

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);

        let max_workers = match std::env::var("MAX_WORKERS") {
            Ok(s) => s
                .parse::<usize>()
                .context("MAX_WORKERS must be a positive integer")?,
            Err(_) => defaults.max_workers,
        };

        let max_retries = match std::env::var("MAX_RETRIES") {
            Ok(s) => s
                .parse::<u32>()
                .context("MAX_RETRIES must be a non-negative integer")?,
            Err(_) => defaults.max_retries,
        };

        let job_timeout = match std::env::var("JOB_TIMEOUT") {
            Ok(s) => Duration::from_secs(
                s.parse::<u64>()
                    .context("JOB_TIMEOUT must be a number of seconds")?,
            ),
            Err(_) => defaults.job_timeout,
        };

        let poll_interval = match std::env::var("JOB_LOOP_INTERVAL") {
            Ok(s) => Duration::from_secs(
                s.parse::<u64>()
                    .context("JOB_LOOP_INTERVAL must be a number of seconds")?,
            ),
            Err(_) => defaults.poll_interval,
        };

        Ok(Self {
            database_file,
            bind_addr,
            max_workers,
            max_retries,
            job_timeout,
            poll_interval,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_file.is_empty() {
            anyhow::bail!("database_file cannot be empty");
        }

        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.max_workers == 0 {
            anyhow::bail!("max_workers must be greater than 0");
        }

        if self.job_timeout.as_secs() == 0 {
            anyhow::bail!("job_timeout must be greater than 0");
        }

        if self.poll_interval.as_secs() == 0 && self.poll_interval.as_millis() == 0 {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
