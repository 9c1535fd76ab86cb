//! Job-related API endpoints

use crate::JobRunnerClient;
use crate::error::Result;
use jobrunner_core::domain::job::Job;
use jobrunner_core::dto::job::{JobFilter, SubmitJob};
use uuid::Uuid;

impl JobRunnerClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a new job for execution
    ///
    /// # Arguments
    /// * `req` - The job submission request
    ///
    /// # Returns
    /// The created job, still in the Pending state
    ///
    /// # Example
    /// ```no_run
    /// # use jobrunner_client::JobRunnerClient;
    /// # use jobrunner_core::dto::job::SubmitJob;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = JobRunnerClient::new("http://localhost:8080");
    /// let job = client.submit_job(SubmitJob {
    ///     kind: "command".to_string(),
    ///     args: serde_json::json!({ "program": "echo", "args": ["hello"] }),
    ///     ..SubmitJob::default()
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_job(&self, req: SubmitJob) -> Result<Job> {
        let url = format!("{}/jobs", self.base_url);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Cancel a pending or running job
    ///
    /// # Arguments
    /// * `job_id` - The job UUID
    ///
    /// # Returns
    /// The job after cancellation
    pub async fn cancel_job(&self, job_id: Uuid) -> Result<Job> {
        let url = format!("{}/jobs/{}/cancel", self.base_url, job_id);
        let response = self.client.post(&url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Job Inspection
    // =============================================================================

    /// Get a job by ID
    ///
    /// # Arguments
    /// * `job_id` - The job UUID
    ///
    /// # Returns
    /// The job details
    pub async fn get_job(&self, job_id: Uuid) -> Result<Job> {
        let url = format!("{}/jobs/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List jobs matching a filter
    ///
    /// Unset filter fields are omitted from the query string, so an
    /// empty filter lists the most recent jobs of every kind and state.
    ///
    /// # Arguments
    /// * `filter` - State, kind, and limit constraints
    ///
    /// # Returns
    /// Matching jobs, most recently submitted first
    pub async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let url = format!("{}/jobs", self.base_url);
        let response = self.client.get(&url).query(filter).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Service Health
    // =============================================================================

    /// Check that the service is up
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_empty_response(response).await
    }
}
