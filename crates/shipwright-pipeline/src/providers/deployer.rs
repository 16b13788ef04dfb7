use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use super::command::run_shell;
use crate::error::CollaboratorError;
use crate::traits::{Deployer, DeploymentRequest};

/// Deploys by running the configured command.
///
/// The default URL is `<base>/deployments/<issue-key>-<unix-seconds>`; a
/// command may override it by printing a URL as its last line. Without a
/// command the deployment is a no-op that succeeds with the default URL.
pub struct CommandDeployer {
    project_root: PathBuf,
    command: Option<String>,
    timeout: Duration,
    url_base: String,
}

impl CommandDeployer {
    #[must_use]
    pub fn new(
        project_root: &Path,
        command: Option<&str>,
        timeout: Duration,
        url_base: &str,
    ) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            command: command.map(str::to_string),
            timeout,
            url_base: url_base.trim_end_matches('/').to_string(),
        }
    }

    fn default_url(&self, issue_key: &str) -> String {
        format!(
            "{}/deployments/{}-{}",
            self.url_base,
            issue_key.to_lowercase(),
            Utc::now().timestamp()
        )
    }
}

impl Deployer for CommandDeployer {
    fn deploy(&self, request: &DeploymentRequest<'_>) -> Result<String, CollaboratorError> {
        let url = self.default_url(request.issue_key);
        let Some(command) = &self.command else {
            debug!(url = %url, "no deploy command configured");
            return Ok(url);
        };

        let output = run_shell(
            command,
            &self.project_root,
            self.timeout,
            &[
                ("SHIPWRIGHT_ISSUE_KEY", request.issue_key),
                ("SHIPWRIGHT_BRANCH", request.branch),
                ("SHIPWRIGHT_COMMIT", request.commit_id.unwrap_or_default()),
                ("SHIPWRIGHT_DEPLOYMENT_URL", url.as_str()),
            ],
        )?;
        if !output.success() {
            return Err(output.into_failure(command));
        }

        let reported = output
            .stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .filter(|line| line.starts_with("https://") || line.starts_with("http://"))
            .map(str::to_string);
        Ok(reported.unwrap_or(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request() -> DeploymentRequest<'static> {
        DeploymentRequest {
            issue_key: "SHIP-5",
            branch: "feature/ship-5-1",
            commit_id: Some("abc"),
        }
    }

    #[test]
    fn unset_command_returns_default_url() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let deployer =
            CommandDeployer::new(dir.path(), None, Duration::from_secs(10), "https://app.test/");

        let url = deployer.deploy(&request())?;

        assert!(url.starts_with("https://app.test/deployments/ship-5-"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn command_may_report_its_own_url() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let deployer = CommandDeployer::new(
            dir.path(),
            Some("echo deploying $SHIPWRIGHT_BRANCH; echo https://preview.test/$SHIPWRIGHT_COMMIT"),
            Duration::from_secs(10),
            "https://app.test",
        );

        assert_eq!(deployer.deploy(&request())?, "https://preview.test/abc");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_an_error() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let deployer = CommandDeployer::new(
            dir.path(),
            Some("echo boom >&2; exit 2"),
            Duration::from_secs(10),
            "https://app.test",
        );

        let result = deployer.deploy(&request());

        assert!(matches!(
            result,
            Err(CollaboratorError::CommandFailed { ref output, .. }) if output == "boom"
        ));
        Ok(())
    }
}
