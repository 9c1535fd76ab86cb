//! Worker pool
//!
//! Runs claimed jobs on a bounded set of slots. A slot is one owned
//! semaphore permit plus an entry in the slot table mapping the job id
//! to its cancellation flag. The permit travels into the job task and
//! frees the slot when the task ends, whatever the outcome.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobrunner_core::domain::job::{FailureKind, Job};
use serde_json::Value as JsonValue;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::context::ServiceContext;
use crate::executor::{CancelFlag, ExecError, JobContext};
use crate::service::job_service::{self, JobError};

/// Outcome of one execution attempt
enum ExecOutcome {
    Succeeded(JsonValue),
    Failed(String),
    TimedOut(Duration),
    Cancelled,
}

/// Bounded pool of worker slots
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    max_workers: usize,
    slots: Mutex<HashMap<Uuid, CancelFlag>>,
}

impl WorkerPool {
    /// Creates a pool with `max_workers` slots
    pub fn new(max_workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Tries to reserve a slot for dispatch
    ///
    /// Returns None when every slot is busy; the dispatcher then leaves
    /// the queue untouched instead of dropping work.
    pub fn try_acquire_slot(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().try_acquire_owned().ok()
    }

    /// Number of currently free slots
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Ids of jobs currently occupying a slot
    pub fn running_jobs(&self) -> Vec<Uuid> {
        self.slots.lock().unwrap().keys().copied().collect()
    }

    /// Flips the cancellation flag of a running job
    ///
    /// Returns false when the job holds no slot, meaning it already
    /// finished or never started.
    pub fn cancel(&self, id: Uuid) -> bool {
        let slots = self.slots.lock().unwrap();
        match slots.get(&id) {
            Some(flag) => {
                flag.cancel();
                true
            }
            None => false,
        }
    }

    /// Waits until every slot is free
    pub async fn wait_idle(&self) {
        // Holding all permits at once means no job task is still running
        let _all = self.semaphore.acquire_many(self.max_workers as u32).await;
    }

    /// Spawns the execution task for a claimed job
    ///
    /// The permit rides along and is released when the task finishes,
    /// together with the slot table entry.
    pub fn spawn_job(
        &self,
        ctx: Arc<ServiceContext>,
        job: Job,
        permit: OwnedSemaphorePermit,
    ) -> JoinHandle<()> {
        let flag = CancelFlag::new();
        self.slots.lock().unwrap().insert(job.id, flag.clone());

        tokio::spawn(async move {
            let outcome = Self::execute(&ctx, &job, flag).await;

            // The flag is dead once the outcome is decided; report may
            // re-queue the job and the next attempt registers its own
            ctx.workers.slots.lock().unwrap().remove(&job.id);

            Self::report(&ctx, &job, outcome).await;
            drop(permit);

            // A freed slot may unblock the next pending job
            ctx.queue_notify.notify_one();
        })
    }

    /// Runs one attempt under the effective timeout
    async fn execute(ctx: &Arc<ServiceContext>, job: &Job, flag: CancelFlag) -> ExecOutcome {
        let Some(executor) = ctx.executors.get(&job.kind) else {
            return ExecOutcome::Failed(format!("No executor registered for kind: {}", job.kind));
        };

        let timeout = job
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(ctx.config.job_timeout);

        let exec_ctx = JobContext::new(job.id, job.args.clone(), flag.clone());

        info!(
            "Executing job {} (kind: {}, attempt {})",
            job.id,
            job.kind,
            job.retry_count + 1
        );

        let mut handle = tokio::spawn(async move { executor.execute(exec_ctx).await });

        match time::timeout(timeout, &mut handle).await {
            Ok(Ok(Ok(value))) => ExecOutcome::Succeeded(value),
            Ok(Ok(Err(ExecError::Cancelled))) => ExecOutcome::Cancelled,
            Ok(Ok(Err(ExecError::Failed(message)))) => ExecOutcome::Failed(message),
            Ok(Err(join_err)) => ExecOutcome::Failed(format!("Payload panicked: {}", join_err)),
            Err(_) => {
                // No grace period past the deadline
                handle.abort();
                flag.cancel();
                ExecOutcome::TimedOut(timeout)
            }
        }
    }

    /// Reports the outcome to the store through the service layer
    async fn report(ctx: &Arc<ServiceContext>, job: &Job, outcome: ExecOutcome) {
        let result = match outcome {
            ExecOutcome::Succeeded(value) => job_service::complete_job(ctx, job.id, value).await,
            ExecOutcome::Failed(message) => {
                job_service::fail_job(ctx, job.id, FailureKind::Execution, message)
                    .await
                    .map(|_| ())
            }
            ExecOutcome::TimedOut(timeout) => {
                let message = format!("Execution exceeded timeout of {}s", timeout.as_secs());
                job_service::fail_job(ctx, job.id, FailureKind::Timeout, message)
                    .await
                    .map(|_| ())
            }
            ExecOutcome::Cancelled => {
                debug!("Job {} stopped at a cancellation checkpoint", job.id);
                return;
            }
        };

        match result {
            Ok(()) => {}
            // The cancel path already moved the job to a terminal state
            Err(JobError::InvalidTransition { from, to }) => {
                debug!(
                    "Job {} transition to {:?} skipped, job is {:?}",
                    job.id, to, from
                );
            }
            Err(e) => {
                error!("Failed to record outcome of job {}: {:?}", job.id, e);
            }
        }
    }
}
