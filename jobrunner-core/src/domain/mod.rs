//! Core domain types
//!
//! This module contains the core domain structures used across the jobrunner
//! crates. These types represent the fundamental business entities and are
//! shared between the service (for persistence and execution) and the client.

pub mod job;
