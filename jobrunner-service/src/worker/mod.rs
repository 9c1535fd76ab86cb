//! Worker Module
//!
//! Bounded concurrent execution of claimed jobs.

pub mod pool;

pub use pool::WorkerPool;
