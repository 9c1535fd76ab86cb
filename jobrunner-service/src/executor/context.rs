//! Job execution context
//!
//! Carries the data a payload executor needs at runtime, including the
//! cooperative cancellation flag shared with the worker pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::executor::ExecError;

/// Cooperative cancellation flag shared between the worker pool and a
/// running payload
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a new, unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Execution context handed to a payload executor
#[derive(Debug, Clone)]
pub struct JobContext {
    job_id: Uuid,
    args: JsonValue,
    cancel: CancelFlag,
}

impl JobContext {
    /// Creates a context for one execution attempt
    pub fn new(job_id: Uuid, args: JsonValue, cancel: CancelFlag) -> Self {
        Self {
            job_id,
            args,
            cancel,
        }
    }

    /// The id of the job being executed
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// The submitted payload arguments
    pub fn args(&self) -> &JsonValue {
        &self.args
    }

    /// Whether cancellation has been requested for this job
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns `ExecError::Cancelled` once the cancellation flag is set
    pub fn checkpoint(&self) -> Result<(), ExecError> {
        if self.is_cancelled() {
            Err(ExecError::Cancelled)
        } else {
            Ok(())
        }
    }
}
