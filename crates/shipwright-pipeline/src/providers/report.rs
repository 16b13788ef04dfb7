use std::path::Path;

use shipwright_core::{RunReport, WorkflowRecord};
use shipwright_report::write_report;

use crate::error::CollaboratorError;
use crate::traits::ReportWriter;

/// Writes the Markdown report to disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemReportWriter;

impl FileSystemReportWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ReportWriter for FileSystemReportWriter {
    fn write(
        &self,
        path: &Path,
        record: &WorkflowRecord,
        report: &RunReport,
    ) -> Result<(), CollaboratorError> {
        write_report(path, record, report)?;
        Ok(())
    }
}
