//! Executor that spawns `<shell> -c <command>` on the local host.

use std::io::ErrorKind;

use tokio::process::Command;
use tracing::{debug, trace};

use super::{CommandExecutor, preview};
use crate::error::{CopgError, Result};

/// Runs commands through a shell binary (`su` on a rooted device, `sh` elsewhere).
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    shell: String,
}

impl ProcessExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Executor for the root shell.
    pub fn su() -> Self {
        Self::new("su")
    }

    /// Executor for the unprivileged system shell.
    pub fn sh() -> Self {
        Self::new("sh")
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::su()
    }
}

impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, command: &str) -> Result<String> {
        debug!(shell = %self.shell, command = %preview(command), "Executing command");

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    CopgError::BridgeUnavailable(format!("'{}' is not available: {e}", self.shell))
                } else {
                    CopgError::Io(e)
                }
            })?;

        if output.status.success() {
            let stdout = String::from_utf8(output.stdout).map_err(|e| {
                CopgError::Persistence(format!(
                    "output of '{}' is not valid UTF-8: {}",
                    preview(command),
                    e.utf8_error()
                ))
            })?;
            trace!(bytes = stdout.len(), "Command succeeded");
            return Ok(stdout);
        }

        let code = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            format!("exit code {code}")
        } else {
            stderr
        };
        debug!(code = %code, stderr = %stderr, "Command failed");

        Err(CopgError::CommandFailed {
            command: preview(command),
            code,
            stderr,
        })
    }
}
