//! Job API Handlers
//!
//! HTTP endpoints for job submission and lifecycle management.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use jobrunner_core::domain::job::Job;
use jobrunner_core::dto::job::{JobFilter, SubmitJob};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::context::ServiceContext;
use crate::service::job_service;

/// POST /jobs
/// Submit a new job for execution
pub async fn submit_job(
    State(ctx): State<Arc<ServiceContext>>,
    Json(req): Json<SubmitJob>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    tracing::info!("Submitting job (kind: {})", req.kind);

    let job = job_service::submit_job(&ctx, req)
        .await
        .map_err(|e| match e {
            job_service::JobError::ValidationError(msg) => ApiError::BadRequest(msg),
            job_service::JobError::NotFound(id) => {
                ApiError::NotFound(format!("Job {} not found", id))
            }
            job_service::JobError::InvalidTransition { from, to } => {
                ApiError::Conflict(format!("Cannot move job from {:?} to {:?}", from, to))
            }
            job_service::JobError::DatabaseError(err) => ApiError::DatabaseError(err),
        })?;

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /jobs/{id}
/// Get job details by ID
pub async fn get_job(
    State(ctx): State<Arc<ServiceContext>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Job>> {
    tracing::debug!("Getting job: {}", id);

    let job = job_service::get_job(&ctx, id).await.map_err(|e| match e {
        job_service::JobError::NotFound(id) => ApiError::NotFound(format!("Job {} not found", id)),
        job_service::JobError::ValidationError(msg) => ApiError::BadRequest(msg),
        job_service::JobError::InvalidTransition { from, to } => {
            ApiError::Conflict(format!("Cannot move job from {:?} to {:?}", from, to))
        }
        job_service::JobError::DatabaseError(err) => ApiError::DatabaseError(err),
    })?;

    Ok(Json(job))
}

/// GET /jobs
/// List jobs, optionally filtered by state and kind
///
/// Query parameters:
/// - `state` (optional): Only jobs in this lifecycle state
/// - `kind` (optional): Only jobs of this payload kind
/// - `limit` (optional): Cap on the number of rows returned
pub async fn list_jobs(
    State(ctx): State<Arc<ServiceContext>>,
    Query(filter): Query<JobFilter>,
) -> ApiResult<Json<Vec<Job>>> {
    tracing::debug!("Listing jobs (filter: {:?})", filter);

    let jobs = job_service::list_jobs(&ctx, &filter)
        .await
        .map_err(|e| match e {
            job_service::JobError::DatabaseError(err) => ApiError::DatabaseError(err),
            job_service::JobError::NotFound(id) => {
                ApiError::NotFound(format!("Job {} not found", id))
            }
            job_service::JobError::ValidationError(msg) => ApiError::BadRequest(msg),
            job_service::JobError::InvalidTransition { from, to } => {
                ApiError::Conflict(format!("Cannot move job from {:?} to {:?}", from, to))
            }
        })?;

    Ok(Json(jobs))
}

/// POST /jobs/{id}/cancel
/// Cancel a pending or running job
pub async fn cancel_job(
    State(ctx): State<Arc<ServiceContext>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Job>> {
    tracing::info!("Cancelling job: {}", id);

    let job = job_service::cancel_job(&ctx, id)
        .await
        .map_err(|e| match e {
            job_service::JobError::NotFound(id) => {
                ApiError::NotFound(format!("Job {} not found", id))
            }
            job_service::JobError::InvalidTransition { from, .. } => {
                ApiError::Conflict(format!("Cannot cancel job in state {:?}", from))
            }
            job_service::JobError::ValidationError(msg) => ApiError::BadRequest(msg),
            job_service::JobError::DatabaseError(err) => ApiError::DatabaseError(err),
        })?;

    Ok(Json(job))
}
