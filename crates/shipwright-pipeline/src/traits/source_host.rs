use std::path::Path;

use crate::error::CollaboratorError;

pub trait SourceHost: Send + Sync {
    /// Creates (or switches to) the branch the run's work lands on.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch cannot be created.
    fn create_branch(&self, name: &str) -> Result<bool, CollaboratorError>;

    /// Commits the given project-relative paths and returns the commit id.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or committing fails.
    fn commit(&self, message: &str, paths: &[&Path]) -> Result<String, CollaboratorError>;

    /// Returns the pull request URL, or `None` when the host has no pull
    /// request concept.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the request.
    fn create_pull_request(
        &self,
        branch: &str,
        title: &str,
        body: &str,
    ) -> Result<Option<String>, CollaboratorError>;
}
