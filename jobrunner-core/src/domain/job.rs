//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job execution record
///
/// Structure owned by the job store and updated by the dispatcher and
/// worker pool as the job moves through its lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Name of the registered executor that runs this payload
    pub kind: String,
    /// Executor-specific arguments
    pub args: serde_json::Value,
    /// Higher priority jobs are dispatched first
    pub priority: i64,
    pub state: JobState,
    /// Human-readable progress line, updated on every transition
    pub status_message: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    /// Jobs that must succeed before this one becomes eligible
    pub depends_on: Vec<Uuid>,
    /// Per-job execution timeout, overrides the service default
    pub timeout_secs: Option<u64>,
    pub result: Option<serde_json::Value>,
    pub error_kind: Option<FailureKind>,
    pub error_message: Option<String>,
}

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// Category of a recorded job failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The payload ran and reported an error
    Execution,
    /// The payload exceeded its execution timeout
    Timeout,
    /// A dependency failed or was cancelled, so the job never started
    Dependency,
}

impl JobState {
    /// Whether a job in this state will never change state again
    ///
    /// A persisted Failed job is terminal: retries re-queue the job
    /// atomically at failure time, so a Failed row means the retry
    /// budget is exhausted.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }

    /// Whether the lifecycle permits moving from this state to `to`
    ///
    /// Pending jobs are dispatched to Running, cancelled, or failed
    /// when a dependency fails. Running jobs finish as Succeeded or
    /// Failed, or are cancelled. Failed jobs may only be re-queued.
    pub fn can_transition_to(&self, to: JobState) -> bool {
        matches!(
            (self, to),
            (JobState::Pending, JobState::Running)
                | (JobState::Pending, JobState::Cancelled)
                | (JobState::Pending, JobState::Failed)
                | (JobState::Running, JobState::Succeeded)
                | (JobState::Running, JobState::Failed)
                | (JobState::Running, JobState::Cancelled)
                | (JobState::Failed, JobState::Pending)
        )
    }
}

impl Job {
    /// Creates a new pending job with a fresh id and submission timestamp
    pub fn new(
        kind: String,
        args: serde_json::Value,
        priority: i64,
        depends_on: Vec<Uuid>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            args,
            priority,
            state: JobState::Pending,
            status_message: None,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
            retry_count: 0,
            depends_on,
            timeout_secs,
            result: None,
            error_kind: None,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_pending() {
        let job = Job::new(
            "command".to_string(),
            serde_json::json!({"program": "true"}),
            0,
            Vec::new(),
            None,
        );

        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.retry_count, 0);
        assert!(job.started_at.is_none());
        assert!(job.finished_at.is_none());
        assert!(job.result.is_none());
    }

    #[test]
    fn test_lifecycle_transitions() {
        assert!(JobState::Pending.can_transition_to(JobState::Running));
        assert!(JobState::Pending.can_transition_to(JobState::Cancelled));
        assert!(JobState::Pending.can_transition_to(JobState::Failed));
        assert!(JobState::Running.can_transition_to(JobState::Succeeded));
        assert!(JobState::Running.can_transition_to(JobState::Failed));
        assert!(JobState::Running.can_transition_to(JobState::Cancelled));
        assert!(JobState::Failed.can_transition_to(JobState::Pending));
    }

    #[test]
    fn test_terminal_states_have_no_transitions() {
        for terminal in [JobState::Succeeded, JobState::Cancelled] {
            for to in [
                JobState::Pending,
                JobState::Running,
                JobState::Succeeded,
                JobState::Failed,
                JobState::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(to));
            }
        }

        // Failed only re-queues, it never jumps straight back to Running
        assert!(!JobState::Failed.can_transition_to(JobState::Running));
        assert!(!JobState::Failed.can_transition_to(JobState::Succeeded));
        assert!(!JobState::Failed.can_transition_to(JobState::Cancelled));
    }

    #[test]
    fn test_is_terminal() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
    }

    #[test]
    fn test_pending_never_skips_to_succeeded() {
        assert!(!JobState::Pending.can_transition_to(JobState::Succeeded));
        assert!(!JobState::Running.can_transition_to(JobState::Pending));
    }
}
