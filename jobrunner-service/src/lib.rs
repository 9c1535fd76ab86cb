//! Jobrunner Service
//!
//! A self-contained job execution service: accepts job submissions over
//! HTTP, persists them in an embedded SQLite store, and runs them on a
//! bounded worker pool.
//!
//! Architecture:
//! - Configuration: settings from environment or defaults
//! - Store: all SQL against the jobs table
//! - Services: business logic and lifecycle rules
//! - Executors: pluggable payload implementations
//! - Workers: bounded concurrent payload execution
//! - Dispatch: the queue scan and assignment loop
//! - API: HTTP endpoints for submission and inspection

pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod dispatch;
pub mod executor;
pub mod service;
pub mod store;
pub mod worker;
