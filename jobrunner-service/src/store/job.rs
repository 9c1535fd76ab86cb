//! Job Store
//!
//! Handles all database operations related to jobs. Ids are stored as
//! their canonical text form, dependency lists and payloads as JSON.

use jobrunner_core::domain::job::{FailureKind, Job, JobState};
use jobrunner_core::dto::job::{JobFilter, SubmitJob};
use serde_json::Value as JsonValue;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

/// Jobs returned by an unbounded list request
const DEFAULT_LIST_LIMIT: u32 = 100;

/// Hard cap on list results
const MAX_LIST_LIMIT: u32 = 500;

const ALL_COLUMNS: &str = r#"
    SELECT id, kind, args, priority, state, status_message, submitted_at,
           started_at, finished_at, retry_count, depends_on, timeout_secs,
           result, error_kind, error_message
    FROM jobs
"#;

/// Create a new pending job in the database
///
/// Validation happens in the service layer before this is called; a
/// rejected submission never reaches the store.
pub async fn create(pool: &SqlitePool, req: SubmitJob) -> Result<Job, sqlx::Error> {
    let mut job = Job::new(
        req.kind,
        req.args,
        req.priority,
        req.depends_on,
        req.timeout_secs,
    );

    job.status_message = Some(if job.depends_on.is_empty() {
        "Waiting for available workers".to_string()
    } else {
        "Waiting on dependencies".to_string()
    });

    sqlx::query(
        r#"
        INSERT INTO jobs (id, kind, args, priority, state, status_message,
                          submitted_at, retry_count, depends_on, timeout_secs)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(job.id.to_string())
    .bind(&job.kind)
    .bind(&job.args)
    .bind(job.priority)
    .bind(state_to_string(job.state))
    .bind(&job.status_message)
    .bind(job.submitted_at)
    .bind(job.retry_count as i64)
    .bind(serde_json::to_value(&job.depends_on).unwrap_or_default())
    .bind(job.timeout_secs.map(|t| t as i64))
    .execute(pool)
    .await?;

    Ok(job)
}

/// Find a job by ID
pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Job>, sqlx::Error> {
    let query = format!("{} WHERE id = ?", ALL_COLUMNS);

    let row = sqlx::query_as::<_, JobRow>(&query)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.into()))
}

/// Find a job by ID inside a transaction
pub async fn find_by_id_tx(
    tx: &mut Transaction<'_, Sqlite>,
    id: Uuid,
) -> Result<Option<Job>, sqlx::Error> {
    let query = format!("{} WHERE id = ?", ALL_COLUMNS);

    let row = sqlx::query_as::<_, JobRow>(&query)
        .bind(id.to_string())
        .fetch_optional(&mut **tx)
        .await?;

    Ok(row.map(|r| r.into()))
}

/// List jobs matching the filter, newest first
pub async fn list(pool: &SqlitePool, filter: &JobFilter) -> Result<Vec<Job>, sqlx::Error> {
    let state = filter.state.map(state_to_string);
    let limit = filter.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT) as i64;

    let query = format!(
        r#"
        {}
        WHERE (? IS NULL OR state = ?)
          AND (? IS NULL OR kind = ?)
        ORDER BY submitted_at DESC
        LIMIT ?
        "#,
        ALL_COLUMNS
    );

    let rows = sqlx::query_as::<_, JobRow>(&query)
        .bind(state)
        .bind(state)
        .bind(&filter.kind)
        .bind(&filter.kind)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Pending jobs in dispatch order: priority first, then submission order
pub async fn pending_in_order(pool: &SqlitePool) -> Result<Vec<Job>, sqlx::Error> {
    let query = format!(
        "{} WHERE state = ? ORDER BY priority DESC, submitted_at ASC, id ASC",
        ALL_COLUMNS
    );

    let rows = sqlx::query_as::<_, JobRow>(&query)
        .bind(state_to_string(JobState::Pending))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Claim a pending job for execution
///
/// The conditional update is the single point where jobs move from
/// Pending to Running, so a job can never be claimed twice.
pub async fn claim(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET state = ?, started_at = ?, status_message = ?
        WHERE id = ? AND state = ?
        "#,
    )
    .bind(state_to_string(JobState::Running))
    .bind(now)
    .bind("Started")
    .bind(id.to_string())
    .bind(state_to_string(JobState::Pending))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Transition Updates
// =============================================================================

/// Mark a job successful with its result payload
pub async fn apply_succeeded(
    tx: &mut Transaction<'_, Sqlite>,
    id: Uuid,
    result: &JsonValue,
) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now();

    sqlx::query(
        r#"
        UPDATE jobs
        SET state = ?, finished_at = ?, result = ?, status_message = ?,
            error_kind = NULL, error_message = NULL
        WHERE id = ?
        "#,
    )
    .bind(state_to_string(JobState::Succeeded))
    .bind(now)
    .bind(result)
    .bind("Completed successfully")
    .bind(id.to_string())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Mark a job failed for good
pub async fn apply_failed(
    tx: &mut Transaction<'_, Sqlite>,
    id: Uuid,
    kind: FailureKind,
    message: &str,
) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now();

    sqlx::query(
        r#"
        UPDATE jobs
        SET state = ?, finished_at = ?, error_kind = ?, error_message = ?,
            status_message = ?
        WHERE id = ?
        "#,
    )
    .bind(state_to_string(JobState::Failed))
    .bind(now)
    .bind(failure_kind_to_string(kind))
    .bind(message)
    .bind(message)
    .bind(id.to_string())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Re-queue a failed job for another attempt
///
/// The latest failure stays visible through error_kind and error_message
/// until the job succeeds or fails again.
pub async fn apply_retry(
    tx: &mut Transaction<'_, Sqlite>,
    id: Uuid,
    kind: FailureKind,
    message: &str,
    status_message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET state = ?, retry_count = retry_count + 1, started_at = NULL,
            finished_at = NULL, error_kind = ?, error_message = ?,
            status_message = ?
        WHERE id = ?
        "#,
    )
    .bind(state_to_string(JobState::Pending))
    .bind(failure_kind_to_string(kind))
    .bind(message)
    .bind(status_message)
    .bind(id.to_string())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Mark a job cancelled
pub async fn apply_cancelled(
    tx: &mut Transaction<'_, Sqlite>,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now();

    sqlx::query(
        r#"
        UPDATE jobs
        SET state = ?, finished_at = ?, status_message = ?
        WHERE id = ?
        "#,
    )
    .bind(state_to_string(JobState::Cancelled))
    .bind(now)
    .bind("Cancelled by request")
    .bind(id.to_string())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Update the human-readable progress line of a job
pub async fn update_status_message(
    pool: &SqlitePool,
    id: Uuid,
    message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE jobs SET status_message = ? WHERE id = ?")
        .bind(message)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Recover jobs left Running by a previous process
///
/// Interrupted jobs are re-queued while they have retry budget and failed
/// otherwise. Returns (re-queued, failed) counts.
pub async fn recover_interrupted(
    pool: &SqlitePool,
    max_retries: u32,
) -> Result<(u64, u64), sqlx::Error> {
    let mut tx = pool.begin().await?;
    let now = chrono::Utc::now();

    let requeued = sqlx::query(
        r#"
        UPDATE jobs
        SET state = ?, retry_count = retry_count + 1, started_at = NULL,
            status_message = ?
        WHERE state = ? AND retry_count < ?
        "#,
    )
    .bind(state_to_string(JobState::Pending))
    .bind("Re-queued after service restart")
    .bind(state_to_string(JobState::Running))
    .bind(max_retries as i64)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let failed = sqlx::query(
        r#"
        UPDATE jobs
        SET state = ?, finished_at = ?, error_kind = ?, error_message = ?,
            status_message = ?
        WHERE state = ?
        "#,
    )
    .bind(state_to_string(JobState::Failed))
    .bind(now)
    .bind(failure_kind_to_string(FailureKind::Execution))
    .bind("Interrupted by service restart")
    .bind("Interrupted by service restart")
    .bind(state_to_string(JobState::Running))
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    Ok((requeued, failed))
}

// =============================================================================
// Helper Functions
// =============================================================================

fn state_to_string(state: JobState) -> &'static str {
    match state {
        JobState::Pending => "Pending",
        JobState::Running => "Running",
        JobState::Succeeded => "Succeeded",
        JobState::Failed => "Failed",
        JobState::Cancelled => "Cancelled",
    }
}

fn string_to_state(s: &str) -> JobState {
    match s {
        "Pending" => JobState::Pending,
        "Running" => JobState::Running,
        "Succeeded" => JobState::Succeeded,
        "Failed" => JobState::Failed,
        "Cancelled" => JobState::Cancelled,
        _ => JobState::Pending,
    }
}

fn failure_kind_to_string(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Execution => "Execution",
        FailureKind::Timeout => "Timeout",
        FailureKind::Dependency => "Dependency",
    }
}

fn string_to_failure_kind(s: &str) -> FailureKind {
    match s {
        "Timeout" => FailureKind::Timeout,
        "Dependency" => FailureKind::Dependency,
        _ => FailureKind::Execution,
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    id: String,
    kind: String,
    args: serde_json::Value,
    priority: i64,
    state: String,
    status_message: Option<String>,
    submitted_at: chrono::DateTime<chrono::Utc>,
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    finished_at: Option<chrono::DateTime<chrono::Utc>>,
    retry_count: i64,
    depends_on: serde_json::Value,
    timeout_secs: Option<i64>,
    result: Option<serde_json::Value>,
    error_kind: Option<String>,
    error_message: Option<String>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        let state = string_to_state(&row.state);
        let depends_on = serde_json::from_value(row.depends_on).unwrap_or_default();
        let error_kind = row.error_kind.as_deref().map(string_to_failure_kind);

        Job {
            id: row.id.parse().unwrap_or_default(),
            kind: row.kind,
            args: row.args,
            priority: row.priority,
            state,
            status_message: row.status_message,
            submitted_at: row.submitted_at,
            started_at: row.started_at,
            finished_at: row.finished_at,
            retry_count: row.retry_count.max(0) as u32,
            depends_on,
            timeout_secs: row.timeout_secs.map(|t| t.max(0) as u64),
            result: row.result,
            error_kind,
            error_message: row.error_message,
        }
    }
}
