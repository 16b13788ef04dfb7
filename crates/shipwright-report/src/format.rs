use std::fmt::Write;

use shipwright_core::{RunReport, WorkflowRecord};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Makes text safe for a single Markdown table cell.
#[must_use]
pub fn escape_cell(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace(['\r', '\n'], " ")
}

/// Renders the run report for a finished record.
#[must_use]
pub fn format_report(record: &WorkflowRecord, report: &RunReport) -> String {
    let mut output = String::new();

    format_header(&mut output, record, report);
    format_checklist(&mut output, report);
    format_file_changes(&mut output, record);
    format_test_results(&mut output, record);
    format_delivery(&mut output, record);
    format_trace_log(&mut output, record);
    format_errors(&mut output, record);

    output
}

fn format_header(output: &mut String, record: &WorkflowRecord, report: &RunReport) {
    let title = record.issue_key().unwrap_or("Unverified event");
    let _ = writeln!(output, "# Pipeline Report: {title}");
    output.push('\n');

    if let Some(identity) = record.identity() {
        let _ = writeln!(output, "**Summary:** {}", identity.summary());
        if !identity.issue_type().is_empty() {
            let _ = writeln!(output, "**Type:** {}", identity.issue_type());
        }
    }
    let _ = writeln!(output, "**Trace ID:** `{}`", record.trace_id());
    let _ = writeln!(output, "**Status:** {}", report.overall_status);
    let _ = writeln!(
        output,
        "**Success rate:** {:.1}% ({}/{} checks)",
        report.success_rate * 100.0,
        report.checklist.passed(),
        report.checklist.total()
    );
    let _ = writeln!(
        output,
        "**Generated:** {}",
        report.generated_at.format(TIMESTAMP_FORMAT)
    );
}

fn format_checklist(output: &mut String, report: &RunReport) {
    output.push_str("\n## Audit Checklist\n\n");
    for check in report.checklist.checks() {
        let mark = if check.passed { "x" } else { " " };
        let _ = writeln!(output, "- [{mark}] {}", check.name);
    }
}

fn format_file_changes(output: &mut String, record: &WorkflowRecord) {
    output.push_str("\n## File Changes\n\n");
    if record.file_changes().is_empty() {
        output.push_str("No files were changed.\n");
        return;
    }

    output.push_str("| File | Action | Lines | Backup |\n");
    output.push_str("|------|--------|-------|--------|\n");
    for change in record.file_changes() {
        let backup = change
            .backup_path()
            .map_or_else(|| "-".to_string(), |p| escape_cell(&p.display().to_string()));
        let _ = writeln!(
            output,
            "| {} | {} | {} | {backup} |",
            escape_cell(&change.path().display().to_string()),
            change.action(),
            change.lines_added()
        );
    }

    if let Some(rollback) = record.rollback() {
        let _ = writeln!(
            output,
            "\nRolled back: {} removed, {} restored, {} failed.",
            rollback.removed,
            rollback.restored,
            rollback.failures.len()
        );
    }
}

fn format_test_results(output: &mut String, record: &WorkflowRecord) {
    output.push_str("\n## Test Results\n\n");
    if record.test_results().is_empty() {
        output.push_str("No tests were run.\n");
        return;
    }

    output.push_str("| Suite | Passed | Failed |\n");
    output.push_str("|-------|--------|--------|\n");
    for result in record.test_results() {
        let _ = writeln!(
            output,
            "| {} | {} | {} |",
            escape_cell(&result.suite),
            result.passed,
            result.failed
        );
    }
}

fn format_delivery(output: &mut String, record: &WorkflowRecord) {
    let links = [
        ("Commit", record.commit_id()),
        ("Pull request", record.pr_url()),
        ("Deployment", record.deployment_url()),
    ];
    if links.iter().all(|(_, value)| value.is_none()) {
        return;
    }

    output.push_str("\n## Delivery\n\n");
    for (label, value) in links {
        if let Some(value) = value {
            let _ = writeln!(output, "- {label}: {value}");
        }
    }
}

fn format_trace_log(output: &mut String, record: &WorkflowRecord) {
    output.push_str("\n## Trace Log\n\n");
    if record.trace_log().is_empty() {
        output.push_str("No trace entries.\n");
        return;
    }

    output.push_str("| Time | Status | Comment |\n");
    output.push_str("|------|--------|---------|\n");
    for entry in record.trace_log() {
        let _ = writeln!(
            output,
            "| {} | {} | {} |",
            entry.timestamp.format(TIMESTAMP_FORMAT),
            entry.status,
            escape_cell(&entry.comment)
        );
    }
}

fn format_errors(output: &mut String, record: &WorkflowRecord) {
    output.push_str("\n## Errors\n\n");
    if record.errors().is_empty() {
        output.push_str("None.\n");
        return;
    }

    for error in record.errors() {
        let _ = writeln!(output, "- {error}");
    }
}
