use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use shipwright_core::TestResult;
use tracing::debug;

use super::command::run_shell;
use crate::error::CollaboratorError;
use crate::traits::TestRunner;

/// Runs the configured test command in the project root.
///
/// The derived suite paths are passed newline-separated in
/// `SHIPWRIGHT_TEST_FILES`; the exit status decides pass or fail. Without a
/// command no tests run and the result list is empty.
pub struct CommandTestRunner {
    project_root: PathBuf,
    command: Option<String>,
    timeout: Duration,
}

impl CommandTestRunner {
    #[must_use]
    pub fn new(project_root: &Path, command: Option<&str>, timeout: Duration) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            command: command.map(str::to_string),
            timeout,
        }
    }
}

impl TestRunner for CommandTestRunner {
    fn run(&self, suite: &IndexMap<PathBuf, String>) -> Result<Vec<TestResult>, CollaboratorError> {
        let Some(command) = &self.command else {
            debug!("no test command configured");
            return Ok(Vec::new());
        };

        let files = suite
            .keys()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        let output = run_shell(
            command,
            &self.project_root,
            self.timeout,
            &[("SHIPWRIGHT_TEST_FILES", files.as_str())],
        )?;

        let passed = output.success();
        Ok(vec![TestResult {
            suite: command.clone(),
            passed: u32::from(passed),
            failed: u32::from(!passed),
            output: Some(output.tail()),
        }])
    }
}
