//! Dispatch Module
//!
//! The queue scan and assignment loop.

pub mod dispatcher;

pub use dispatcher::Dispatcher;
