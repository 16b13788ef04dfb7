use std::path::PathBuf;

use indexmap::IndexMap;
use shipwright_core::TestResult;

use crate::error::CollaboratorError;

pub trait TestRunner: Send + Sync {
    /// Runs the project's tests against the derived suite (test file path to
    /// content) and reports one result per suite.
    ///
    /// # Errors
    ///
    /// Returns an error if the runner itself could not complete, as opposed
    /// to tests failing.
    fn run(&self, suite: &IndexMap<PathBuf, String>) -> Result<Vec<TestResult>, CollaboratorError>;
}
