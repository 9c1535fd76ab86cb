//! API Module
//!
//! HTTP API layer for the jobrunner service.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod job;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::context::ServiceContext;

/// Create the main API router with all endpoints
pub fn create_router(ctx: Arc<ServiceContext>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job endpoints
        .route("/jobs", post(job::submit_job))
        .route("/jobs", get(job::list_jobs))
        .route("/jobs/{id}", get(job::get_job))
        .route("/jobs/{id}/cancel", post(job::cancel_job))
        // Add state and middleware
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
}
