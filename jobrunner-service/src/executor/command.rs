//! Command payload executor
//!
//! Runs a program as a child process and captures its exit code, stdout,
//! and stderr into the job result.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tokio::process::Command;
use tokio::time;
use tracing::debug;

use crate::executor::{ExecError, JobContext, PayloadExecutor};

/// How often a running command re-checks the cancellation flag
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Arguments accepted by the command executor
#[derive(Debug, Deserialize)]
struct CommandArgs {
    program: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
}

/// Executes `command` payloads as child processes
pub struct CommandExecutor;

impl CommandExecutor {
    pub fn new() -> Self {
        Self
    }

    fn parse_args(args: &JsonValue) -> Result<CommandArgs, String> {
        let parsed: CommandArgs = serde_json::from_value(args.clone())
            .map_err(|e| format!("Invalid command arguments: {}", e))?;

        if parsed.program.is_empty() {
            return Err("program cannot be empty".to_string());
        }

        Ok(parsed)
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PayloadExecutor for CommandExecutor {
    fn kind(&self) -> &'static str {
        "command"
    }

    fn validate(&self, args: &JsonValue) -> Result<(), String> {
        Self::parse_args(args).map(|_| ())
    }

    async fn execute(&self, ctx: JobContext) -> Result<JsonValue, ExecError> {
        let cmd_args = Self::parse_args(ctx.args()).map_err(ExecError::Failed)?;

        ctx.checkpoint()?;

        debug!("Job {} spawning command: {}", ctx.job_id(), cmd_args.program);

        // kill_on_drop reaps the child if cancellation abandons this future
        let child = Command::new(&cmd_args.program)
            .args(&cmd_args.args)
            .envs(&cmd_args.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ExecError::Failed(format!("Failed to spawn {}: {}", cmd_args.program, e))
            })?;

        let wait = child.wait_with_output();
        tokio::pin!(wait);

        let output = loop {
            tokio::select! {
                res = &mut wait => {
                    break res.map_err(|e| {
                        ExecError::Failed(format!(
                            "Failed to collect output of {}: {}",
                            cmd_args.program, e
                        ))
                    })?;
                }
                _ = time::sleep(CANCEL_POLL_INTERVAL) => {
                    ctx.checkpoint()?;
                }
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code();

        if output.status.success() {
            Ok(json!({
                "exit_code": exit_code,
                "stdout": stdout,
                "stderr": stderr,
            }))
        } else {
            let status_desc = match exit_code {
                Some(code) => code.to_string(),
                None => "signal".to_string(),
            };
            let detail = if stderr.trim().is_empty() {
                format!("Command exited with status {}", status_desc)
            } else {
                format!("Command exited with status {}: {}", status_desc, stderr.trim())
            };
            Err(ExecError::Failed(detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CancelFlag;
    use uuid::Uuid;

    fn test_context(args: JsonValue) -> JobContext {
        JobContext::new(Uuid::new_v4(), args, CancelFlag::new())
    }

    #[test]
    fn test_validate_rejects_missing_program() {
        let executor = CommandExecutor::new();

        assert!(executor.validate(&json!({})).is_err());
        assert!(executor.validate(&json!({"program": ""})).is_err());
        assert!(executor.validate(&json!({"program": "true"})).is_ok());
    }

    #[tokio::test]
    async fn test_execute_captures_output() {
        let executor = CommandExecutor::new();
        let ctx = test_context(json!({"program": "echo", "args": ["hello"]}));

        let result = executor.execute(ctx).await.unwrap();

        assert_eq!(result["exit_code"], 0);
        assert_eq!(result["stdout"], "hello\n");
    }

    #[tokio::test]
    async fn test_execute_reports_nonzero_exit() {
        let executor = CommandExecutor::new();
        let ctx = test_context(json!({"program": "false"}));

        let result = executor.execute(ctx).await;

        assert!(matches!(result, Err(ExecError::Failed(_))));
    }

    #[tokio::test]
    async fn test_execute_rejects_unknown_program() {
        let executor = CommandExecutor::new();
        let ctx = test_context(json!({"program": "/no/such/binary"}));

        let result = executor.execute(ctx).await;

        assert!(matches!(result, Err(ExecError::Failed(_))));
    }

    #[tokio::test]
    async fn test_execute_observes_prior_cancellation() {
        let executor = CommandExecutor::new();
        let flag = CancelFlag::new();
        let ctx = JobContext::new(Uuid::new_v4(), json!({"program": "true"}), flag.clone());

        flag.cancel();
        let result = executor.execute(ctx).await;

        assert!(matches!(result, Err(ExecError::Cancelled)));
    }
}
