//! Jobrunner Core
//!
//! Core types and abstractions for the jobrunner service.
//!
//! This crate contains:
//! - Domain types: Core business entities (Job, JobState, etc.)
//! - DTOs: Data transfer objects for client/service communication

pub mod domain;
pub mod dto;
