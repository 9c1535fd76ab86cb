//! Job DTOs for client/service communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::JobState;

/// Request to submit a new job
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitJob {
    /// Payload kind, must name a registered executor
    pub kind: String,
    /// Executor-specific arguments
    #[serde(default)]
    pub args: serde_json::Value,
    /// Higher priority jobs are dispatched first (default 0)
    #[serde(default)]
    pub priority: i64,
    /// Ids of jobs that must succeed before this one runs
    #[serde(default)]
    pub depends_on: Vec<Uuid>,
    /// Per-job execution timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Filters for listing jobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFilter {
    pub state: Option<JobState>,
    pub kind: Option<String>,
    /// Maximum number of jobs to return, newest first
    pub limit: Option<u32>,
}
