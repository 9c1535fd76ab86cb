//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;

use anyhow::Result;
use clap::Subcommand;
use uuid::Uuid;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a new job
    Submit {
        /// Payload kind (e.g., "command", "sleep")
        #[arg(long)]
        kind: String,

        /// Payload arguments as a JSON value
        #[arg(long, default_value = "{}")]
        args: String,

        /// Queue priority (higher dispatches first)
        #[arg(long, default_value_t = 0)]
        priority: i64,

        /// Jobs that must succeed before this one starts (repeatable)
        #[arg(long = "depends-on")]
        depends_on: Vec<Uuid>,

        /// Execution timeout in seconds, overrides the service default
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Get job details
    Get {
        /// Job ID
        id: Uuid,
    },
    /// List jobs
    List {
        /// Only jobs in this state (pending, running, succeeded, failed, cancelled)
        #[arg(long)]
        state: Option<String>,

        /// Only jobs of this payload kind
        #[arg(long)]
        kind: Option<String>,

        /// Maximum number of jobs to show
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Cancel a job
    Cancel {
        /// Job ID
        id: Uuid,
    },
    /// Wait for a job to reach a terminal state
    Wait {
        /// Job ID
        id: Uuid,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
///
/// # Returns
/// Result indicating success or failure
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Submit {
            kind,
            args,
            priority,
            depends_on,
            timeout,
        } => job::submit_job(config, kind, args, priority, depends_on, timeout).await,
        Commands::Get { id } => job::get_job(config, id).await,
        Commands::List { state, kind, limit } => job::list_jobs(config, state, kind, limit).await,
        Commands::Cancel { id } => job::cancel_job(config, id).await,
        Commands::Wait { id } => job::wait_job(config, id).await,
    }
}
