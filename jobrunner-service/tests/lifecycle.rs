//! End-to-end lifecycle tests
//!
//! Each test boots a full service context (store, executors, worker
//! pool) plus a dispatcher task, submits jobs through the service
//! layer, and observes them move through the lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use uuid::Uuid;

use jobrunner_core::domain::job::{FailureKind, Job, JobState};
use jobrunner_core::dto::job::SubmitJob;
use jobrunner_service::config::Config;
use jobrunner_service::context::ServiceContext;
use jobrunner_service::dispatch::Dispatcher;
use jobrunner_service::service::job_service;
use jobrunner_service::store::job_store;

const POLL: Duration = Duration::from_millis(25);
const DEADLINE: Duration = Duration::from_secs(10);

async fn test_context(max_workers: usize, max_retries: u32) -> Arc<ServiceContext> {
    let config = Config {
        database_file: ":memory:".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        max_workers,
        max_retries,
        job_timeout: Duration::from_secs(30),
        poll_interval: Duration::from_millis(50),
    };
    let ctx = Arc::new(ServiceContext::init(config).await.unwrap());
    tokio::spawn(Dispatcher::new(Arc::clone(&ctx)).run());
    ctx
}

async fn wait_for_state(ctx: &ServiceContext, id: Uuid, target: JobState) -> Job {
    let deadline = Instant::now() + DEADLINE;
    loop {
        let job = job_service::get_job(ctx, id).await.unwrap();
        if job.state == target {
            return job;
        }
        assert!(
            Instant::now() < deadline,
            "job {} stuck in {:?} waiting for {:?} (status: {:?})",
            id,
            job.state,
            target,
            job.status_message
        );
        time::sleep(POLL).await;
    }
}

fn command_job(program: &str, args: &[&str]) -> SubmitJob {
    SubmitJob {
        kind: "command".to_string(),
        args: serde_json::json!({ "program": program, "args": args }),
        ..SubmitJob::default()
    }
}

fn sleep_job(duration_ms: u64) -> SubmitJob {
    SubmitJob {
        kind: "sleep".to_string(),
        args: serde_json::json!({ "duration_ms": duration_ms }),
        ..SubmitJob::default()
    }
}

#[tokio::test]
async fn test_command_job_runs_to_success() {
    let ctx = test_context(2, 0).await;

    let job = job_service::submit_job(&ctx, command_job("echo", &["hello"]))
        .await
        .unwrap();
    assert_eq!(job.state, JobState::Pending);

    let done = wait_for_state(&ctx, job.id, JobState::Succeeded).await;

    assert_eq!(done.status_message.as_deref(), Some("Completed successfully"));
    assert!(done.started_at.is_some());
    assert!(done.finished_at.is_some());
    assert!(done.submitted_at <= done.started_at.unwrap());
    assert!(done.started_at.unwrap() <= done.finished_at.unwrap());
    assert!(done.error_kind.is_none());
    assert!(done.error_message.is_none());

    let result = done.result.unwrap();
    assert_eq!(result["exit_code"], 0);
    assert_eq!(result["stdout"], "hello\n");
    assert_eq!(result["stderr"], "");
}

#[tokio::test]
async fn test_failing_command_consumes_retry_budget() {
    let ctx = test_context(2, 2).await;

    let job = job_service::submit_job(&ctx, command_job("false", &[]))
        .await
        .unwrap();

    let failed = wait_for_state(&ctx, job.id, JobState::Failed).await;

    assert_eq!(failed.retry_count, 2);
    assert_eq!(failed.error_kind, Some(FailureKind::Execution));
    assert!(failed.error_message.is_some());
    assert!(failed.finished_at.is_some());
}

#[tokio::test]
async fn test_retry_succeeds_on_second_attempt() {
    let ctx = test_context(2, 1).await;

    // Fails on the first run (creates the marker), succeeds on the second
    let marker = std::env::temp_dir().join(format!("jobrunner-test-{}", Uuid::new_v4()));
    let script = format!(
        "test -f {marker} || {{ touch {marker}; exit 1; }}",
        marker = marker.display()
    );

    let job = job_service::submit_job(&ctx, command_job("sh", &["-c", &script]))
        .await
        .unwrap();

    let done = wait_for_state(&ctx, job.id, JobState::Succeeded).await;

    assert_eq!(done.retry_count, 1);
    assert_eq!(done.status_message.as_deref(), Some("Completed successfully"));
    // A later success clears the failure recorded on the first attempt
    assert!(done.error_kind.is_none());
    assert!(done.error_message.is_none());

    let _ = std::fs::remove_file(marker);
}

#[tokio::test]
async fn test_retry_attempt_stays_cancellable() {
    let ctx = test_context(2, 1).await;

    // Fails fast on the first run, hangs on the second
    let marker = std::env::temp_dir().join(format!("jobrunner-test-{}", Uuid::new_v4()));
    let script = format!(
        "test -f {marker} || {{ touch {marker}; exit 1; }}; exec sleep 60",
        marker = marker.display()
    );

    let job = job_service::submit_job(&ctx, command_job("sh", &["-c", &script]))
        .await
        .unwrap();

    let deadline = Instant::now() + DEADLINE;
    loop {
        let current = job_service::get_job(&ctx, job.id).await.unwrap();
        if current.state == JobState::Running && current.retry_count == 1 {
            break;
        }
        assert!(Instant::now() < deadline, "second attempt never started");
        time::sleep(POLL).await;
    }

    // The second attempt registered a slot entry of its own, so the
    // cancellation flag must reach it
    assert!(ctx.workers.running_jobs().contains(&job.id));

    let cancelled = job_service::cancel_job(&ctx, job.id).await.unwrap();
    assert_eq!(cancelled.state, JobState::Cancelled);

    // The worker must not overwrite the cancellation once the payload stops
    time::sleep(Duration::from_millis(500)).await;
    let after = job_service::get_job(&ctx, job.id).await.unwrap();
    assert_eq!(after.state, JobState::Cancelled);

    let _ = std::fs::remove_file(marker);
}

#[tokio::test]
async fn test_slow_job_times_out() {
    let ctx = test_context(2, 0).await;

    let job = job_service::submit_job(
        &ctx,
        SubmitJob {
            timeout_secs: Some(1),
            ..sleep_job(60_000)
        },
    )
    .await
    .unwrap();

    let failed = wait_for_state(&ctx, job.id, JobState::Failed).await;

    assert_eq!(failed.error_kind, Some(FailureKind::Timeout));
    assert!(
        failed
            .error_message
            .as_deref()
            .unwrap_or_default()
            .contains("timeout")
    );
}

#[tokio::test]
async fn test_dispatched_job_occupies_worker_slot() {
    let ctx = test_context(2, 0).await;

    let job = job_service::submit_job(&ctx, sleep_job(60_000)).await.unwrap();
    wait_for_state(&ctx, job.id, JobState::Running).await;

    // A job the dispatcher moved to Running always has a task attached
    assert!(ctx.workers.running_jobs().contains(&job.id));

    job_service::cancel_job(&ctx, job.id).await.unwrap();

    // The slot entry goes away once the payload observes the flag
    let deadline = Instant::now() + DEADLINE;
    while ctx.workers.running_jobs().contains(&job.id) {
        assert!(Instant::now() < deadline, "slot for {} never freed", job.id);
        time::sleep(POLL).await;
    }
}

#[tokio::test]
async fn test_cancel_running_job() {
    let ctx = test_context(2, 0).await;

    let job = job_service::submit_job(&ctx, sleep_job(60_000)).await.unwrap();
    wait_for_state(&ctx, job.id, JobState::Running).await;

    let cancelled = job_service::cancel_job(&ctx, job.id).await.unwrap();
    assert_eq!(cancelled.state, JobState::Cancelled);
    assert!(cancelled.started_at.is_some());
    assert!(cancelled.finished_at.is_some());

    // The worker must not overwrite the cancellation once the payload stops
    time::sleep(Duration::from_millis(500)).await;
    let after = job_service::get_job(&ctx, job.id).await.unwrap();
    assert_eq!(after.state, JobState::Cancelled);
}

#[tokio::test]
async fn test_cancel_queued_job_before_dispatch() {
    let ctx = test_context(1, 0).await;

    let hog = job_service::submit_job(&ctx, sleep_job(60_000)).await.unwrap();
    wait_for_state(&ctx, hog.id, JobState::Running).await;

    // The only slot is busy, so this one stays queued
    let queued = job_service::submit_job(&ctx, sleep_job(1)).await.unwrap();
    let cancelled = job_service::cancel_job(&ctx, queued.id).await.unwrap();

    assert_eq!(cancelled.state, JobState::Cancelled);
    assert!(cancelled.started_at.is_none());

    job_service::cancel_job(&ctx, hog.id).await.unwrap();
}

#[tokio::test]
async fn test_dependency_runs_after_parent_succeeds() {
    let ctx = test_context(2, 0).await;

    let parent = job_service::submit_job(&ctx, sleep_job(200)).await.unwrap();
    let child = job_service::submit_job(
        &ctx,
        SubmitJob {
            depends_on: vec![parent.id],
            ..command_job("echo", &["after"])
        },
    )
    .await
    .unwrap();

    let child_done = wait_for_state(&ctx, child.id, JobState::Succeeded).await;
    let parent_done = job_service::get_job(&ctx, parent.id).await.unwrap();

    assert_eq!(parent_done.state, JobState::Succeeded);
    assert!(parent_done.finished_at.unwrap() <= child_done.started_at.unwrap());
}

#[tokio::test]
async fn test_dependent_job_reports_waiting_status() {
    let ctx = test_context(2, 0).await;

    let parent = job_service::submit_job(&ctx, sleep_job(500)).await.unwrap();
    let child = job_service::submit_job(
        &ctx,
        SubmitJob {
            depends_on: vec![parent.id],
            ..sleep_job(1)
        },
    )
    .await
    .unwrap();

    // The dispatcher marks the child as blocked while the parent runs
    let deadline = Instant::now() + DEADLINE;
    loop {
        let job = job_service::get_job(&ctx, child.id).await.unwrap();
        if job.status_message.as_deref() == Some("Waiting on dependencies") {
            break;
        }
        assert!(
            Instant::now() < deadline,
            "child never reported waiting (status: {:?})",
            job.status_message
        );
        time::sleep(POLL).await;
    }

    wait_for_state(&ctx, child.id, JobState::Succeeded).await;
}

#[tokio::test]
async fn test_dependency_failure_cascades() {
    let ctx = test_context(2, 0).await;

    let parent = job_service::submit_job(&ctx, command_job("false", &[]))
        .await
        .unwrap();
    let child = job_service::submit_job(
        &ctx,
        SubmitJob {
            depends_on: vec![parent.id],
            ..command_job("echo", &["never"])
        },
    )
    .await
    .unwrap();

    let child_failed = wait_for_state(&ctx, child.id, JobState::Failed).await;

    assert_eq!(child_failed.error_kind, Some(FailureKind::Dependency));
    assert_eq!(
        child_failed.error_message.as_deref(),
        Some(format!("Not starting as dependency {} failed", parent.id).as_str())
    );
    assert!(child_failed.started_at.is_none());
}

#[tokio::test]
async fn test_higher_priority_dispatches_first() {
    let ctx = test_context(1, 0).await;

    // Fill the only slot so both submissions queue up behind it
    let hog = job_service::submit_job(&ctx, sleep_job(400)).await.unwrap();
    wait_for_state(&ctx, hog.id, JobState::Running).await;

    let low = job_service::submit_job(&ctx, sleep_job(1)).await.unwrap();
    let high = job_service::submit_job(
        &ctx,
        SubmitJob {
            priority: 5,
            ..sleep_job(1)
        },
    )
    .await
    .unwrap();

    let high_done = wait_for_state(&ctx, high.id, JobState::Succeeded).await;
    let low_done = wait_for_state(&ctx, low.id, JobState::Succeeded).await;

    assert!(high_done.started_at.unwrap() <= low_done.started_at.unwrap());
}

#[tokio::test]
async fn test_restart_recovers_interrupted_jobs() {
    let db_path = std::env::temp_dir().join(format!("jobrunner-test-{}.sqlite", Uuid::new_v4()));
    let database_file = db_path.to_string_lossy().to_string();
    let config = Config {
        database_file: database_file.clone(),
        bind_addr: "127.0.0.1:0".to_string(),
        max_workers: 1,
        max_retries: 1,
        job_timeout: Duration::from_secs(30),
        poll_interval: Duration::from_millis(50),
    };

    // First life: a job is claimed and the process dies mid-run
    let ctx = ServiceContext::init(config.clone()).await.unwrap();
    let job = job_service::submit_job(&ctx, sleep_job(1)).await.unwrap();
    assert!(job_store::claim(&ctx.pool, job.id).await.unwrap());
    ctx.pool.close().await;

    // Second life: within retry budget, the job goes back to the queue
    let ctx = ServiceContext::init(config.clone()).await.unwrap();
    let recovered = job_service::get_job(&ctx, job.id).await.unwrap();
    assert_eq!(recovered.state, JobState::Pending);
    assert_eq!(recovered.retry_count, 1);
    assert_eq!(
        recovered.status_message.as_deref(),
        Some("Re-queued after service restart")
    );
    assert!(recovered.started_at.is_none());

    // Third life: budget exhausted, the job fails for good
    assert!(job_store::claim(&ctx.pool, job.id).await.unwrap());
    ctx.pool.close().await;

    let ctx = ServiceContext::init(config).await.unwrap();
    let failed = job_service::get_job(&ctx, job.id).await.unwrap();
    assert_eq!(failed.state, JobState::Failed);
    assert_eq!(failed.error_kind, Some(FailureKind::Execution));
    assert_eq!(
        failed.error_message.as_deref(),
        Some("Interrupted by service restart")
    );
    ctx.pool.close().await;

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", database_file, suffix));
    }
}
