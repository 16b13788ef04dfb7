use std::fs;
use std::path::{Path, PathBuf};

use shipwright_core::{RunReport, WorkflowRecord};
use tracing::debug;

use crate::error::ReportError;
use crate::format::format_report;

/// File name of a record's report: `<issue_key>.md` once verified,
/// `<trace_id>.md` otherwise.
#[must_use]
pub fn report_file_name(record: &WorkflowRecord) -> PathBuf {
    match record.issue_key() {
        Some(key) => PathBuf::from(format!("{key}.md")),
        None => PathBuf::from(format!("{}.md", record.trace_id())),
    }
}

/// Renders and writes the report to `path`, replacing any earlier report.
///
/// # Errors
///
/// Returns [`ReportError::CreateDir`] if the parent directory cannot be
/// created and [`ReportError::Write`] if the file cannot be written.
pub fn write_report(path: &Path, record: &WorkflowRecord, report: &RunReport) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ReportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, format_report(record, report)).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(report = %path.display(), trace_id = %record.trace_id(), "wrote report");
    Ok(())
}
