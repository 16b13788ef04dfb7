use std::fmt::Write;

use shipwright_core::{ErrorKind, RunReport, StageId, WorkflowRecord};
use shipwright_report::report_file_name;
use tracing::{info, warn};

use crate::context::PipelineContext;
use crate::error::StageError;
use crate::stage::Stage;

const SUMMARY_FILE_LIMIT: usize = 5;
const SUMMARY_ERROR_LIMIT: usize = 3;

/// Terminal stage: scores the record, writes the report artifact, posts a
/// summary to the tracker and finalizes the record.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditStage;

impl Stage for AuditStage {
    fn id(&self) -> StageId {
        StageId::Audit
    }

    fn execute(&self, ctx: &PipelineContext, record: &mut WorkflowRecord) -> Result<(), StageError> {
        let relative = ctx.config().report_dir().join(report_file_name(record));
        let mut report = RunReport::score(record, Some(relative.clone()));

        let target = ctx.project_root().join(&relative);
        if let Err(e) = ctx.report_writer().write(&target, record, &report) {
            warn!(report = %relative.display(), error = %e, "report could not be written");
            record.push_error(
                ErrorKind::Framework,
                format!("failed to write report {}: {e}", relative.display()),
            );
            report.report_path = None;
        }

        post_summary(ctx, record, &report);

        info!(
            status = %report.overall_status,
            success_rate = report.success_rate,
            passed = report.checklist.passed(),
            total = report.checklist.total(),
            "run audited"
        );
        record.finalize(report)?;
        Ok(())
    }
}

fn post_summary(ctx: &PipelineContext, record: &WorkflowRecord, report: &RunReport) {
    let Some(issue_key) = record.issue_key() else {
        return;
    };
    let comment = summary_comment(record, report);
    match ctx.issue_tracker().add_comment(issue_key, &comment) {
        Ok(true) => {}
        Ok(false) => warn!(issue_key, "issue tracker declined summary comment"),
        Err(e) => warn!(issue_key, error = %e, "failed to post summary comment"),
    }
}

fn summary_comment(record: &WorkflowRecord, report: &RunReport) -> String {
    let mut comment = format!(
        "Pipeline finished: {} ({:.0}% of checks passed)\n",
        report.overall_status,
        report.success_rate * 100.0
    );

    let changes = record.file_changes();
    if !changes.is_empty() {
        comment.push_str("\nFile changes:\n");
        for change in changes.iter().take(SUMMARY_FILE_LIMIT) {
            let _ = writeln!(comment, "- {} {}", change.action(), change.path().display());
        }
        if changes.len() > SUMMARY_FILE_LIMIT {
            let _ = writeln!(comment, "- ... and {} more", changes.len() - SUMMARY_FILE_LIMIT);
        }
    }

    let errors = record.errors();
    if !errors.is_empty() {
        comment.push_str("\nErrors:\n");
        for error in errors.iter().take(SUMMARY_ERROR_LIMIT) {
            let _ = writeln!(comment, "- {error}");
        }
    }

    let _ = write!(comment, "\nTrace-Id: {}", record.trace_id());
    if let Some(path) = &report.report_path {
        let _ = write!(comment, "\nReport: {}", path.display());
    }
    comment
}
