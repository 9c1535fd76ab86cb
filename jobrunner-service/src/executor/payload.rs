//! Payload executor trait

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::executor::JobContext;

/// Errors reported by a payload executor
#[derive(Debug, Error)]
pub enum ExecError {
    /// The job's cancellation flag was observed at a checkpoint
    #[error("execution cancelled")]
    Cancelled,

    /// The payload ran and failed
    #[error("{0}")]
    Failed(String),
}

/// Capability that knows how to run one payload kind
///
/// Executors are registered once at service startup. The service layer
/// validates submissions against the registered executor before any job
/// is stored, and the worker pool resolves the executor again when the
/// job is dispatched.
#[async_trait]
pub trait PayloadExecutor: Send + Sync {
    /// The payload kind this executor handles
    fn kind(&self) -> &'static str;

    /// Checks submitted arguments before a job is accepted
    ///
    /// # Arguments
    /// * `args` - The raw arguments from the submission
    ///
    /// # Returns
    /// An error message describing the first problem found
    fn validate(&self, args: &JsonValue) -> Result<(), String>;

    /// Executes the payload
    ///
    /// Implementations should call `ctx.checkpoint()` at natural pause
    /// points so cooperative cancellation can take effect. Timeouts are
    /// enforced by the worker pool, never by the payload itself.
    async fn execute(&self, ctx: JobContext) -> Result<JsonValue, ExecError>;
}
