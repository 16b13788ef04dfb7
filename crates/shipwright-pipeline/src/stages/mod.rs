//! The nine standard stages, in pipeline order.

mod analyze;
mod audit;
mod deploy;
mod generate;
mod persist;
mod plan;
mod rollback_guard;
mod verify;

pub use analyze::AnalyzeStage;
pub use audit::AuditStage;
pub use deploy::DeployStage;
pub use generate::GenerateStage;
pub use persist::PersistStage;
pub use plan::PlanStage;
pub use rollback_guard::RollbackGuardStage;
pub use test::TestStage;
pub use verify::VerifyStage;

use shipwright_core::{IssueStatus, StageId, WorkflowRecord};
use tracing::warn;

use crate::context::PipelineContext;
use crate::error::StageError;
use crate::stage::Stage;

/// One instance of every standard stage.
#[must_use]
pub fn standard_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(VerifyStage),
        Box::new(AnalyzeStage),
        Box::new(PlanStage),
        Box::new(GenerateStage),
        Box::new(PersistStage),
        Box::new(TestStage),
        Box::new(DeployStage),
        Box::new(RollbackGuardStage),
        Box::new(AuditStage),
    ]
}

/// Appends a trace entry and mirrors it to the issue tracker. Tracker
/// failures are logged and otherwise ignored; unverified records are never
/// posted because their key is not trusted.
pub(crate) fn notify(
    ctx: &PipelineContext,
    record: &mut WorkflowRecord,
    status: IssueStatus,
    comment: impl Into<String>,
) {
    let comment = comment.into();
    record.push_trace(status, comment.as_str());

    let Some(issue_key) = record.issue_key() else {
        return;
    };
    match ctx.issue_tracker().update_status(issue_key, status, &comment) {
        Ok(true) => {}
        Ok(false) => warn!(issue_key, %status, "issue tracker declined status update"),
        Err(e) => warn!(issue_key, %status, error = %e, "issue tracker update failed"),
    }
}

pub(crate) fn missing(stage: StageId, what: &'static str) -> StageError {
    StageError::MissingInput { stage, what }
}
