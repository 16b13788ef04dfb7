use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::Builder;
use tracing::debug;

use crate::error::CollaboratorError;

const OUTPUT_TAIL_LINES: usize = 20;

pub(crate) struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn status_text(&self) -> String {
        self.status
            .code()
            .map_or_else(|| "a signal".to_string(), |code| format!("status {code}"))
    }

    /// Last lines of stderr, or of stdout when stderr is empty.
    pub fn tail(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(OUTPUT_TAIL_LINES);
        lines[start..].join("\n")
    }

    pub fn into_failure(self, command: &str) -> CollaboratorError {
        CollaboratorError::CommandFailed {
            command: command.to_string(),
            status: self.status_text(),
            output: self.tail(),
        }
    }
}

/// Runs `command` through the platform shell in `cwd`, killing it once
/// `timeout` elapses.
///
/// Drives the child on a private current-thread runtime, so it must not be
/// called from inside an async context.
pub(crate) fn run_shell(
    command: &str,
    cwd: &Path,
    timeout: Duration,
    envs: &[(&str, &str)],
) -> Result<CommandOutput, CollaboratorError> {
    let io_error = |source| CollaboratorError::CommandIo {
        command: command.to_string(),
        source,
    };

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(io_error)?;

    let mut shell = shell_command(command);
    shell
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .envs(envs.iter().copied())
        .kill_on_drop(true);

    debug!(command, cwd = %cwd.display(), "running command");
    let output = runtime.block_on(async {
        let child = shell.spawn()?;
        Ok::<_, std::io::Error>(tokio::time::timeout(timeout, child.wait_with_output()).await)
    });

    let output = match output.map_err(io_error)? {
        Ok(output) => output.map_err(io_error)?,
        Err(_) => {
            return Err(CollaboratorError::CommandTimeout {
                command: command.to_string(),
                timeout,
            });
        }
    };

    debug!(command, status = %output.status, "command finished");
    Ok(CommandOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut shell = Command::new("sh");
    shell.arg("-c").arg(command);
    shell
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut shell = Command::new("cmd");
    shell.arg("/C").arg(command);
    shell
}
