//! Jobrunner HTTP Client
//!
//! A simple, type-safe HTTP client for communicating with the jobrunner service API.
//!
//! This crate provides a unified interface for tools that submit and track jobs,
//! eliminating code duplication and ensuring consistency.
//!
//! # Example
//!
//! ```no_run
//! use jobrunner_client::JobRunnerClient;
//! use jobrunner_core::dto::job::SubmitJob;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = JobRunnerClient::new("http://localhost:8080");
//!
//!     // Submit a job
//!     let job = client.submit_job(SubmitJob {
//!         kind: "sleep".to_string(),
//!         args: serde_json::json!({ "duration_ms": 1000 }),
//!         ..SubmitJob::default()
//!     }).await?;
//!
//!     println!("Submitted job: {}", job.id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the jobrunner service API
///
/// This client provides methods for all service API endpoints:
/// - Job submission and cancellation
/// - Job inspection (get, filtered listing)
/// - Health checks
#[derive(Debug, Clone)]
pub struct JobRunnerClient {
    /// Base URL of the service (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl JobRunnerClient {
    /// Create a new jobrunner client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the service API (e.g., "http://localhost:8080")
    ///
    /// # Example
    /// ```
    /// use jobrunner_client::JobRunnerClient;
    ///
    /// let client = JobRunnerClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a new jobrunner client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the service API
    /// * `client` - A configured reqwest Client
    ///
    /// # Example
    /// ```
    /// use jobrunner_client::JobRunnerClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = JobRunnerClient::with_client("http://localhost:8080", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is not deserialized (e.g., health checks)
    ///
    /// This method checks the status code and returns an error if the request failed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
