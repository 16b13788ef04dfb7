use shipwright_core::IssueStatus;

use crate::error::CollaboratorError;

/// Posts progress to the issue tracker. Callers treat every failure as
/// best-effort.
pub trait IssueTracker: Send + Sync {
    /// Moves the issue to `status` with an explanatory comment.
    ///
    /// Returns `false` if the tracker declined the update.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker could not be reached.
    fn update_status(
        &self,
        issue_key: &str,
        status: IssueStatus,
        comment: &str,
    ) -> Result<bool, CollaboratorError>;

    /// # Errors
    ///
    /// Returns an error if the tracker could not be reached.
    fn add_comment(&self, issue_key: &str, comment: &str) -> Result<bool, CollaboratorError>;
}
