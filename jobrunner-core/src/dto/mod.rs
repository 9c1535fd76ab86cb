//! Data Transfer Objects for client/service communication
//!
//! This module contains DTOs used for communication between the jobrunner
//! service and its clients (CLI, HTTP client). DTOs are lightweight
//! representations of domain entities optimized for network transfer.

pub mod job;
