//! External command execution.
//!
//! User hook commands are plain shell strings from the config file. They run
//! through the platform shell, one at a time, and are awaited to completion.

use crate::error::{ReleaseError, Result};
use std::future::Future;
use std::path::Path;
use tokio::process::Command;

/// Captured result of an external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited with status 0
    pub success: bool,
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Combined stdout and stderr, for error reports
    pub fn combined(&self) -> String {
        let mut text = self.stdout.trim_end().to_string();
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(stderr);
        }
        text
    }

    /// Convert an unsuccessful output into `CommandFailed`
    pub fn into_result(self, command: &str) -> Result<CommandOutput> {
        if self.success {
            Ok(self)
        } else {
            Err(ReleaseError::CommandFailed {
                command: command.to_string(),
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs user supplied shell commands
pub trait CommandRunner {
    /// Run `command` through the shell in `cwd`.
    ///
    /// A non-zero exit is not an error here; only failing to spawn is.
    fn run_shell(&self, command: &str, cwd: &Path) -> impl Future<Output = Result<CommandOutput>>;
}

/// [`CommandRunner`] backed by `sh -c` (or `cmd /C` on Windows)
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    async fn run_shell(&self, command: &str, cwd: &Path) -> Result<CommandOutput> {
        log::debug!("$ {}", command);
        let output = shell_command(command).current_dir(cwd).output().await?;
        Ok(output.into())
    }
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
