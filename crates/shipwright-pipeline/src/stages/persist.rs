use std::path::{Component, Path, PathBuf};

use shipwright_core::{ErrorKind, IssueStatus, StageId, WorkflowRecord};
use tracing::{debug, info, warn};

use super::notify;
use crate::context::PipelineContext;
use crate::error::StageError;
use crate::stage::Stage;

/// Writes generated artifacts through the transaction manager and, when
/// enabled, commits them on the planned branch.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersistStage;

impl Stage for PersistStage {
    fn id(&self) -> StageId {
        StageId::Persist
    }

    fn execute(&self, ctx: &PipelineContext, record: &mut WorkflowRecord) -> Result<(), StageError> {
        if !record.verification_passed() {
            return Err(StageError::Unverified {
                trace_id: record.trace_id(),
            });
        }

        let trace_id = record.trace_id();
        let artifacts = record.generated_artifacts().clone();
        let mut written = Vec::new();

        for (path, content) in &artifacts {
            if let Some(reason) = refusal_reason(ctx, path) {
                warn!(path = %path.display(), reason, "refusing to write");
                record.push_error(
                    ErrorKind::Persistence,
                    format!("refused to write {}: {reason}", path.display()),
                );
                continue;
            }

            match ctx.files().write(path, content, trace_id) {
                Ok(change) => {
                    debug!(path = %path.display(), action = %change.action(), "persisted");
                    record.push_file_change(change);
                    written.push(path.clone());
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "write failed");
                    record.push_error(
                        ErrorKind::Persistence,
                        format!("failed to write {}: {e}", path.display()),
                    );
                }
            }
        }

        if written.is_empty() {
            info!("no files written");
            return Ok(());
        }

        if ctx.config().git().commit() {
            commit_written(ctx, record, &written);
        }

        info!(files = written.len(), "artifacts persisted");
        notify(
            ctx,
            record,
            IssueStatus::CodeGenerated,
            format!("Wrote {} files", written.len()),
        );
        Ok(())
    }
}

fn refusal_reason(ctx: &PipelineContext, path: &Path) -> Option<&'static str> {
    if path.is_absolute() || path.has_root() {
        return Some("absolute paths are not allowed");
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return Some("parent directory components are not allowed");
    }
    if ctx.config().is_protected(path) {
        return Some("path is protected");
    }
    None
}

fn commit_written(ctx: &PipelineContext, record: &mut WorkflowRecord, written: &[PathBuf]) {
    let Some(branch) = record
        .plan()
        .map(|plan| plan.branch.clone())
        .filter(|branch| !branch.is_empty())
    else {
        record.push_error(ErrorKind::SourceControl, "no branch was planned for the commit");
        return;
    };

    match ctx.source_host().create_branch(&branch) {
        Ok(true) => {}
        Ok(false) => {
            record.push_error(
                ErrorKind::SourceControl,
                format!("source host declined to create branch {branch}"),
            );
            return;
        }
        Err(e) => {
            warn!(branch = %branch, error = %e, "branch creation failed");
            record.push_error(
                ErrorKind::SourceControl,
                format!("failed to create branch {branch}: {e}"),
            );
            return;
        }
    }

    let message = commit_message(record);
    let paths: Vec<&Path> = written.iter().map(PathBuf::as_path).collect();
    match ctx.source_host().commit(&message, &paths) {
        Ok(commit_id) => {
            info!(branch = %branch, commit = %commit_id, "changes committed");
            record.set_commit_id(commit_id);
        }
        Err(e) => {
            warn!(branch = %branch, error = %e, "commit failed");
            record.push_error(ErrorKind::SourceControl, format!("failed to commit: {e}"));
        }
    }
}

fn commit_message(record: &WorkflowRecord) -> String {
    let title = record.identity().map_or_else(
        || "Automated change".to_string(),
        |identity| format!("{}: {}", identity.key(), identity.summary()),
    );
    format!("{title}\n\nTrace-Id: {}", record.trace_id())
}
