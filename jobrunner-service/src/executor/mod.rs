//! Payload executors
//!
//! Job semantics live behind the `PayloadExecutor` capability: each
//! registered executor owns one payload kind, validates its arguments at
//! submission time, and runs the payload under the worker pool's timeout
//! and cancellation control.

mod command;
mod context;
mod payload;
mod registry;
mod sleep;

pub use command::CommandExecutor;
pub use context::{CancelFlag, JobContext};
pub use payload::{ExecError, PayloadExecutor};
pub use registry::ExecutorRegistry;
pub use sleep::SleepExecutor;
