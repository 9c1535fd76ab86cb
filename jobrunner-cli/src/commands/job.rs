//! Job command handlers
//!
//! Handles all job-related CLI commands including submission, listing,
//! cancellation, and waiting on completion.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use colored::*;
use jobrunner_client::JobRunnerClient;
use jobrunner_core::domain::job::{Job, JobState};
use jobrunner_core::dto::job::{JobFilter, SubmitJob};
use uuid::Uuid;

use crate::config::Config;

/// How often `wait` polls the service
const WAIT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Submit a new job
pub async fn submit_job(
    config: &Config,
    kind: String,
    args: String,
    priority: i64,
    depends_on: Vec<Uuid>,
    timeout: Option<u64>,
) -> Result<()> {
    let client = JobRunnerClient::new(&config.service_url);

    let args: serde_json::Value =
        serde_json::from_str(&args).context("--args must be a valid JSON value")?;

    let job = client
        .submit_job(SubmitJob {
            kind,
            args,
            priority,
            depends_on,
            timeout_secs: timeout,
        })
        .await?;

    println!("{}", "Job submitted:".bold());
    print_job_details(&job);

    Ok(())
}

/// Get and display a single job
pub async fn get_job(config: &Config, id: Uuid) -> Result<()> {
    let client = JobRunnerClient::new(&config.service_url);

    let job = client.get_job(id).await?;

    print_job_details(&job);

    Ok(())
}

/// List jobs matching the given filters
pub async fn list_jobs(
    config: &Config,
    state: Option<String>,
    kind: Option<String>,
    limit: Option<u32>,
) -> Result<()> {
    let client = JobRunnerClient::new(&config.service_url);

    let state = state.as_deref().map(parse_state).transpose()?;

    let jobs = client.list_jobs(&JobFilter { state, kind, limit }).await?;

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

/// Cancel a job
pub async fn cancel_job(config: &Config, id: Uuid) -> Result<()> {
    let client = JobRunnerClient::new(&config.service_url);

    let job = client.cancel_job(id).await?;

    println!("{}", "Job cancelled:".bold());
    print_job_details(&job);

    Ok(())
}

/// Poll a job until it reaches a terminal state
///
/// Exits non-zero when the job ends Failed or Cancelled, so this can
/// gate shell pipelines on job success.
pub async fn wait_job(config: &Config, id: Uuid) -> Result<()> {
    let client = JobRunnerClient::new(&config.service_url);

    let mut last_status: Option<String> = None;

    let job = loop {
        let job = client.get_job(id).await?;

        if job.state.is_terminal() {
            break job;
        }

        if job.status_message != last_status {
            if let Some(message) = &job.status_message {
                println!("  {} {}", format!("{:?}:", job.state).dimmed(), message);
            }
            last_status = job.status_message.clone();
        }

        tokio::time::sleep(WAIT_POLL_INTERVAL).await;
    };

    print_job_details(&job);

    match job.state {
        JobState::Succeeded => Ok(()),
        JobState::Failed => bail!("Job {} failed", job.id),
        JobState::Cancelled => bail!("Job {} was cancelled", job.id),
        JobState::Pending | JobState::Running => Ok(()),
    }
}

/// Print a job summary from a full Job object
fn print_job_summary(job: &Job) {
    let state_colored = colorize_state(&job.state);

    println!("  {} Job {}", "▸".cyan(), job.id.to_string().dimmed());
    println!("    Kind:      {}", job.kind);
    println!("    State:     {}", state_colored);
    println!(
        "    Submitted: {}",
        job.submitted_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    if let Some(message) = &job.status_message {
        println!("    Status:    {}", message.dimmed());
    }
    println!();
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    let state_colored = colorize_state(&job.state);

    println!("{}", "Job Details:".bold());
    println!("  ID:        {}", job.id.to_string().cyan());
    println!("  Kind:      {}", job.kind);
    println!("  State:     {}", state_colored);
    println!("  Priority:  {}", job.priority);
    println!(
        "  Submitted: {}",
        job.submitted_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(started) = job.started_at {
        println!("  Started:   {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(finished) = job.finished_at {
        println!("  Finished:  {}", finished.format("%Y-%m-%d %H:%M:%S"));

        // Calculate duration
        if let Some(started) = job.started_at {
            let duration = finished.signed_duration_since(started);
            println!("  Duration:  {}s", duration.num_seconds());
        }
    }

    if job.retry_count > 0 {
        println!("  Retries:   {}", job.retry_count);
    }

    if let Some(message) = &job.status_message {
        println!("  Status:    {}", message);
    }

    if !job.depends_on.is_empty() {
        println!("\n{}", "Depends on:".bold());
        for dep in &job.depends_on {
            println!("  {}", dep.to_string().dimmed());
        }
    }

    if let Some(result) = &job.result {
        println!("\n{}", "Result:".bold());
        if let Ok(pretty) = serde_json::to_string_pretty(result) {
            println!("{}", pretty);
        } else {
            println!("{:?}", result);
        }
    }

    if let Some(error) = &job.error_message {
        println!("\n{}", "Error:".bold());
        if let Some(kind) = job.error_kind {
            println!("  {} {}", format!("({:?})", kind).red(), error.red());
        } else {
            println!("  {}", error.red());
        }
    }
}

/// Colorize job state for display
fn colorize_state(state: &JobState) -> colored::ColoredString {
    let state_str = format!("{:?}", state);
    match state {
        JobState::Pending => state_str.yellow(),
        JobState::Running => state_str.cyan(),
        JobState::Succeeded => state_str.green(),
        JobState::Failed => state_str.red(),
        JobState::Cancelled => state_str.dimmed(),
    }
}

/// Parse a state filter argument
fn parse_state(s: &str) -> Result<JobState> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(JobState::Pending),
        "running" => Ok(JobState::Running),
        "succeeded" => Ok(JobState::Succeeded),
        "failed" => Ok(JobState::Failed),
        "cancelled" => Ok(JobState::Cancelled),
        other => bail!(
            "Unknown state: {} (expected pending, running, succeeded, failed, or cancelled)",
            other
        ),
    }
}
