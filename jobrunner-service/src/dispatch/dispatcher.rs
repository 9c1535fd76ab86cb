//! Job dispatcher
//!
//! The single task that assigns pending jobs to worker slots.
//! Assignment is serialized here: nothing else moves jobs from Pending
//! to Running, and a slot is reserved before a job is claimed, so a
//! saturated pool leaves the queue untouched.

use std::sync::Arc;

use jobrunner_core::domain::job::{FailureKind, Job, JobState};
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::context::ServiceContext;
use crate::service::job_service::{self, JobError};
use crate::store::job_store;

/// Dependency readiness of one pending job
enum DepState {
    /// Every dependency succeeded
    Ready,
    /// At least one dependency is still pending or running
    Waiting,
    /// The named dependency can never succeed
    Blocked(Uuid),
}

/// The queue scan and assignment loop
pub struct Dispatcher {
    ctx: Arc<ServiceContext>,
    shutdown: watch::Receiver<bool>,
}

impl Dispatcher {
    /// Creates a new dispatcher bound to the service context
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        let shutdown = ctx.subscribe_shutdown();
        Self { ctx, shutdown }
    }

    /// Runs the dispatch loop until shutdown is signalled
    pub async fn run(mut self) {
        info!(
            "Starting dispatcher (poll interval: {:?}, workers: {})",
            self.ctx.config.poll_interval, self.ctx.config.max_workers
        );

        let mut interval = time::interval(self.ctx.config.poll_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.ctx.queue_notify.notified() => {}
                _ = self.shutdown.changed() => {}
            }

            if *self.shutdown.borrow() {
                break;
            }

            match self.dispatch_ready().await {
                Ok(dispatched) if dispatched > 0 => {
                    debug!("Dispatched {} job(s) this cycle", dispatched);
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Dispatch cycle failed: {:?}", e);
                }
            }
        }

        info!("Dispatcher stopped");
    }

    /// Assigns eligible jobs to free slots until either runs out
    async fn dispatch_ready(&self) -> Result<usize, JobError> {
        let mut dispatched = 0;

        loop {
            // Reserve the slot before touching the queue
            let Some(permit) = self.ctx.workers.try_acquire_slot() else {
                debug!("All worker slots busy");
                break;
            };

            let Some(job) = self.next_eligible().await? else {
                drop(permit);
                break;
            };

            // A cancel landing between the scan and this claim wins
            if !job_store::claim(&self.ctx.pool, job.id).await? {
                debug!("Job {} was gone by claim time, rescanning", job.id);
                drop(permit);
                continue;
            }

            // The claim changes only state and started_at; the worker
            // reads neither, so the scanned row is handed over as is
            self.ctx.workers.spawn_job(Arc::clone(&self.ctx), job, permit);
            dispatched += 1;
        }

        Ok(dispatched)
    }

    /// Scans pending jobs in queue order for the first eligible one
    ///
    /// Jobs whose dependency can never succeed are failed on the spot;
    /// jobs still waiting on dependencies are skipped.
    async fn next_eligible(&self) -> Result<Option<Job>, JobError> {
        let pending = job_store::pending_in_order(&self.ctx.pool).await?;

        for job in pending {
            match self.dependency_state(&job).await? {
                DepState::Ready => return Ok(Some(job)),
                DepState::Waiting => {
                    if job.status_message.as_deref() != Some("Waiting on dependencies") {
                        job_store::update_status_message(
                            &self.ctx.pool,
                            job.id,
                            "Waiting on dependencies",
                        )
                        .await?;
                    }
                }
                DepState::Blocked(dep_id) => {
                    let message = format!("Not starting as dependency {} failed", dep_id);
                    match job_service::fail_job(&self.ctx, job.id, FailureKind::Dependency, message)
                        .await
                    {
                        Ok(_) => {
                            info!("Job {} failed, dependency {} did not succeed", job.id, dep_id)
                        }
                        // Lost a race against cancel; nothing to record
                        Err(JobError::InvalidTransition { .. }) => {}
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        Ok(None)
    }

    /// Checks whether every dependency of a job has succeeded
    async fn dependency_state(&self, job: &Job) -> Result<DepState, JobError> {
        let mut waiting = false;

        for dep_id in &job.depends_on {
            let Some(dep) = job_store::find_by_id(&self.ctx.pool, *dep_id).await? else {
                // Dependencies are checked at submit time; a missing row
                // can never reach Succeeded
                return Ok(DepState::Blocked(*dep_id));
            };

            match dep.state {
                JobState::Succeeded => {}
                JobState::Failed | JobState::Cancelled => return Ok(DepState::Blocked(*dep_id)),
                JobState::Pending | JobState::Running => waiting = true,
            }
        }

        if waiting {
            Ok(DepState::Waiting)
        } else {
            Ok(DepState::Ready)
        }
    }
}
