//! Service Module
//!
//! Business logic layer for the jobrunner service.
//! Services compose store operations inside transactions and own the
//! lifecycle rules; handlers and workers never touch SQL directly.

pub mod job;

// Re-export for convenience
pub use job as job_service;
