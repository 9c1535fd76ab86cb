//! Store Module
//!
//! Data access layer for the jobrunner service.
//! All SQL lives here; state machine checks live in the service layer,
//! which composes these functions inside transactions.

pub mod job;

// Re-export for convenience
pub use job as job_store;
