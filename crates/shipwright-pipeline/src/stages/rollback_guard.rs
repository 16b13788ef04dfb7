use std::fmt::Write;

use shipwright_core::{ErrorKind, IssueStatus, RollbackSummary, StageId, WorkflowRecord};
use tracing::{error, info, warn};

use super::notify;
use crate::context::PipelineContext;
use crate::error::StageError;
use crate::stage::Stage;

/// Post-deploy health gate. Any recorded error or an unsuccessful
/// deployment reverts every file change of the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollbackGuardStage;

impl Stage for RollbackGuardStage {
    fn id(&self) -> StageId {
        StageId::RollbackGuard
    }

    fn execute(&self, ctx: &PipelineContext, record: &mut WorkflowRecord) -> Result<(), StageError> {
        let health = ctx.health_check().check(record.deployment_url());
        match health {
            Ok(problems) => {
                for problem in problems {
                    warn!(problem = %problem, "health check reported a problem");
                    record.push_error(ErrorKind::Health, problem);
                }
            }
            Err(e) => {
                warn!(error = %e, "health check could not run");
                record.push_error(ErrorKind::Health, format!("health check failed: {e}"));
            }
        }

        if !record.has_errors() && record.deployment_successful() {
            info!("deployment healthy");
            return Ok(());
        }

        let outcome = ctx.files().rollback(record.file_changes());
        let summary = RollbackSummary {
            removed: outcome.removed,
            restored: outcome.restored,
            failures: outcome
                .failures
                .iter()
                .map(|failure| format!("{}: {}", failure.path.display(), failure.error))
                .collect(),
        };

        let mut comment = format!(
            "Automatic rollback: {} files removed, {} restored",
            summary.removed, summary.restored
        );
        if summary.is_clean() {
            info!(
                removed = summary.removed,
                restored = summary.restored,
                "rollback complete"
            );
        } else {
            error!(
                failures = summary.failures.len(),
                "rollback left files unreverted"
            );
            let _ = write!(comment, ", {} failed", summary.failures.len());
        }

        record.record_rollback(summary);
        notify(ctx, record, IssueStatus::Failed, comment);
        Ok(())
    }
}
