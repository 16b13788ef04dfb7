use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use super::command::run_shell;
use crate::error::CollaboratorError;
use crate::traits::HealthCheck;

/// Health check backed by a shell command; a non-zero exit is one problem.
pub struct CommandHealthCheck {
    project_root: PathBuf,
    command: Option<String>,
    timeout: Duration,
}

impl CommandHealthCheck {
    #[must_use]
    pub fn new(project_root: &Path, command: Option<&str>, timeout: Duration) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            command: command.map(str::to_string),
            timeout,
        }
    }
}

impl HealthCheck for CommandHealthCheck {
    fn check(&self, deployment_url: Option<&str>) -> Result<Vec<String>, CollaboratorError> {
        let Some(command) = &self.command else {
            debug!("no health command configured");
            return Ok(Vec::new());
        };

        let output = run_shell(
            command,
            &self.project_root,
            self.timeout,
            &[("SHIPWRIGHT_DEPLOYMENT_URL", deployment_url.unwrap_or_default())],
        )?;
        if output.success() {
            return Ok(Vec::new());
        }
        Ok(vec![format!(
            "health command exited with {}: {}",
            output.status_text(),
            output.tail()
        )])
    }
}
