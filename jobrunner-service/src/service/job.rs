//! Job Service
//!
//! Business logic for job submission and lifecycle transitions. Every
//! state change runs inside a transaction that re-reads the job and
//! re-checks the lifecycle rules, so concurrent writers cannot push a
//! job through an illegal transition.

use jobrunner_core::domain::job::{FailureKind, Job, JobState};
use jobrunner_core::dto::job::{JobFilter, SubmitJob};
use uuid::Uuid;

use crate::context::ServiceContext;
use crate::store::job_store;

/// Service error type
#[derive(Debug)]
pub enum JobError {
    NotFound(Uuid),
    InvalidTransition { from: JobState, to: JobState },
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for JobError {
    fn from(err: sqlx::Error) -> Self {
        JobError::DatabaseError(err)
    }
}

/// Validates and stores a new job submission
///
/// The payload kind must be registered and its arguments must pass the
/// executor's validation before anything is written, so a rejected
/// submission leaves no trace in the store.
pub async fn submit_job(ctx: &ServiceContext, req: SubmitJob) -> Result<Job, JobError> {
    validate_submission(ctx, &req)?;

    // Dependencies must already exist when the job is accepted
    for dep_id in &req.depends_on {
        job_store::find_by_id(&ctx.pool, *dep_id)
            .await?
            .ok_or_else(|| JobError::ValidationError(format!("Unknown dependency: {}", dep_id)))?;
    }

    let job = job_store::create(&ctx.pool, req).await?;

    tracing::info!("Job {} submitted (kind: {})", job.id, job.kind);

    ctx.queue_notify.notify_one();

    Ok(job)
}

/// Gets a job by ID
pub async fn get_job(ctx: &ServiceContext, id: Uuid) -> Result<Job, JobError> {
    let job = job_store::find_by_id(&ctx.pool, id)
        .await?
        .ok_or(JobError::NotFound(id))?;

    Ok(job)
}

/// Lists jobs matching a filter
pub async fn list_jobs(ctx: &ServiceContext, filter: &JobFilter) -> Result<Vec<Job>, JobError> {
    let jobs = job_store::list(&ctx.pool, filter).await?;

    Ok(jobs)
}

/// Cancels a job
///
/// Pending jobs are cancelled before they ever reach a worker. Running
/// jobs are moved to Cancelled in the store first and then signalled
/// through their slot's cancellation flag; the payload stops at its
/// next checkpoint.
pub async fn cancel_job(ctx: &ServiceContext, id: Uuid) -> Result<Job, JobError> {
    let mut tx = ctx.pool.begin().await?;

    let job = job_store::find_by_id_tx(&mut tx, id)
        .await?
        .ok_or(JobError::NotFound(id))?;

    if !job.state.can_transition_to(JobState::Cancelled) {
        return Err(JobError::InvalidTransition {
            from: job.state,
            to: JobState::Cancelled,
        });
    }

    job_store::apply_cancelled(&mut tx, id).await?;
    tx.commit().await?;

    if job.state == JobState::Running {
        ctx.workers.cancel(id);
    }

    tracing::info!("Job {} cancelled (was {:?})", id, job.state);

    let cancelled = job_store::find_by_id(&ctx.pool, id)
        .await?
        .ok_or(JobError::NotFound(id))?;

    Ok(cancelled)
}

/// Records a successful execution
pub async fn complete_job(
    ctx: &ServiceContext,
    id: Uuid,
    result: serde_json::Value,
) -> Result<(), JobError> {
    let mut tx = ctx.pool.begin().await?;

    let job = job_store::find_by_id_tx(&mut tx, id)
        .await?
        .ok_or(JobError::NotFound(id))?;

    if !job.state.can_transition_to(JobState::Succeeded) {
        return Err(JobError::InvalidTransition {
            from: job.state,
            to: JobState::Succeeded,
        });
    }

    job_store::apply_succeeded(&mut tx, id, &result).await?;
    tx.commit().await?;

    tracing::info!("Job {} completed successfully", id);

    Ok(())
}

/// Records a failed execution attempt, applying the retry policy
///
/// Execution and timeout failures consume retry budget and re-queue
/// the job while budget remains. Dependency failures are terminal and
/// may only be recorded against jobs that never started.
///
/// Returns true when the job was re-queued for another attempt.
pub async fn fail_job(
    ctx: &ServiceContext,
    id: Uuid,
    kind: FailureKind,
    message: String,
) -> Result<bool, JobError> {
    let mut tx = ctx.pool.begin().await?;

    let job = job_store::find_by_id_tx(&mut tx, id)
        .await?
        .ok_or(JobError::NotFound(id))?;

    let expected_from = match kind {
        FailureKind::Dependency => JobState::Pending,
        FailureKind::Execution | FailureKind::Timeout => JobState::Running,
    };

    if job.state != expected_from {
        return Err(JobError::InvalidTransition {
            from: job.state,
            to: JobState::Failed,
        });
    }

    let retry = kind != FailureKind::Dependency && job.retry_count < ctx.config.max_retries;

    if retry {
        let status_message = format!(
            "Retrying after failure (attempt {} of {}): {}",
            job.retry_count + 1,
            ctx.config.max_retries,
            message
        );
        job_store::apply_retry(&mut tx, id, kind, &message, &status_message).await?;
    } else {
        job_store::apply_failed(&mut tx, id, kind, &message).await?;
    }

    tx.commit().await?;

    if retry {
        tracing::warn!("Job {} failed ({:?}), re-queued for retry: {}", id, kind, message);
        ctx.queue_notify.notify_one();
    } else {
        tracing::warn!("Job {} failed ({:?}): {}", id, kind, message);
    }

    Ok(retry)
}

// =============================================================================
// Validation
// =============================================================================

fn validate_submission(ctx: &ServiceContext, req: &SubmitJob) -> Result<(), JobError> {
    if req.kind.is_empty() {
        return Err(JobError::ValidationError("kind cannot be empty".to_string()));
    }

    let executor = ctx.executors.get(&req.kind).ok_or_else(|| {
        JobError::ValidationError(format!(
            "Unknown payload kind: {} (registered: {})",
            req.kind,
            ctx.executors.kinds().join(", ")
        ))
    })?;

    executor.validate(&req.args).map_err(JobError::ValidationError)?;

    if req.timeout_secs == Some(0) {
        return Err(JobError::ValidationError(
            "timeout_secs must be greater than 0".to_string(),
        ));
    }

    // Stored in a signed column; anything larger would wrap negative
    if req.timeout_secs.is_some_and(|t| t > i64::MAX as u64) {
        return Err(JobError::ValidationError(format!(
            "timeout_secs must be at most {}",
            i64::MAX
        )));
    }

    Ok(())
}
