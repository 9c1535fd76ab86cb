//! Sleep payload executor
//!
//! Sleeps for a requested duration with cancellation checkpoints between
//! slices. Useful for operational smoke tests of the dispatch, timeout,
//! and cancellation paths.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tokio::time;

use crate::executor::{ExecError, JobContext, PayloadExecutor};

/// Longest single sleep between two cancellation checkpoints
const CHECKPOINT_SLICE: Duration = Duration::from_millis(50);

/// Arguments accepted by the sleep executor
#[derive(Debug, Deserialize)]
struct SleepArgs {
    duration_ms: u64,
}

/// Executes `sleep` payloads
pub struct SleepExecutor;

impl SleepExecutor {
    pub fn new() -> Self {
        Self
    }

    fn parse_args(args: &JsonValue) -> Result<SleepArgs, String> {
        serde_json::from_value(args.clone()).map_err(|e| format!("Invalid sleep arguments: {}", e))
    }
}

impl Default for SleepExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PayloadExecutor for SleepExecutor {
    fn kind(&self) -> &'static str {
        "sleep"
    }

    fn validate(&self, args: &JsonValue) -> Result<(), String> {
        Self::parse_args(args).map(|_| ())
    }

    async fn execute(&self, ctx: JobContext) -> Result<JsonValue, ExecError> {
        let sleep_args = Self::parse_args(ctx.args()).map_err(ExecError::Failed)?;

        let mut remaining = Duration::from_millis(sleep_args.duration_ms);

        while !remaining.is_zero() {
            ctx.checkpoint()?;
            let slice = remaining.min(CHECKPOINT_SLICE);
            time::sleep(slice).await;
            remaining -= slice;
        }

        ctx.checkpoint()?;

        Ok(json!({ "slept_ms": sleep_args.duration_ms }))
    }
}
