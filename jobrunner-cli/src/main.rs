//! Jobrunner CLI
//!
//! Command-line interface for submitting and tracking jobs on the
//! jobrunner service.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "jobrunner")]
#[command(about = "Jobrunner service CLI", long_about = None)]
struct Cli {
    /// Service URL
    #[arg(long, env = "JOBRUNNER_URL", default_value = "http://localhost:8080")]
    service_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        service_url: cli.service_url,
    };

    handle_command(cli.command, &config).await
}
