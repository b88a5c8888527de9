//! Child process execution with captured output and timeouts.

use anyhow::{Context, Result};
use log::debug;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::RealRuntime;
use crate::error::RepoError;

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Render a command line for logs and error messages.
pub fn describe_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) async fn run_command_impl(
        &self,
        program: &str,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        let command_line = describe_command(program, args);
        debug!("Running {}", command_line);

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RepoError::ExternalTool {
                command: command_line.clone(),
                exit_code: None,
                message: format!("failed to start: {}", e),
            })?;

        let output = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output,
                Err(_) => {
                    return Err(RepoError::ExternalTool {
                        command: command_line,
                        exit_code: None,
                        message: format!("timed out after {}s", limit.as_secs_f64()),
                    }
                    .into());
                }
            },
            None => child.wait_with_output().await,
        }
        .with_context(|| format!("Failed to wait for '{}'", command_line))?;

        let stdout = String::from_utf8(output.stdout).map_err(|e| RepoError::ExternalTool {
            command: command_line.clone(),
            exit_code: output.status.code(),
            message: format!("unreadable output: {}", e),
        })?;

        Ok(CommandOutput {
            stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}
