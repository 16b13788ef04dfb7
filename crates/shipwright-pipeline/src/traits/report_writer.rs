use std::path::Path;

use shipwright_core::{RunReport, WorkflowRecord};

use crate::error::CollaboratorError;

pub trait ReportWriter: Send + Sync {
    /// Writes the report artifact, replacing an earlier one at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be written.
    fn write(
        &self,
        path: &Path,
        record: &WorkflowRecord,
        report: &RunReport,
    ) -> Result<(), CollaboratorError>;
}
