use shipwright_core::IssueStatus;
use tracing::info;

use crate::error::CollaboratorError;
use crate::traits::IssueTracker;

/// Issue tracker that only logs. Used when no tracker is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingIssueTracker;

impl TracingIssueTracker {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl IssueTracker for TracingIssueTracker {
    fn update_status(
        &self,
        issue_key: &str,
        status: IssueStatus,
        comment: &str,
    ) -> Result<bool, CollaboratorError> {
        info!(issue_key, %status, comment, "issue status update");
        Ok(true)
    }

    fn add_comment(&self, issue_key: &str, comment: &str) -> Result<bool, CollaboratorError> {
        info!(issue_key, comment, "issue comment");
        Ok(true)
    }
}
