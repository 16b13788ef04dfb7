use chrono::Utc;
use shipwright_core::{IssueStatus, Plan, PlanTarget, Requirements, StageId, TargetKind, WorkflowRecord};
use tracing::info;

use super::{missing, notify};
use crate::context::PipelineContext;
use crate::error::StageError;
use crate::stage::Stage;

/// Orders file targets and names the branch the run works on.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanStage;

impl Stage for PlanStage {
    fn id(&self) -> StageId {
        StageId::Plan
    }

    fn execute(&self, ctx: &PipelineContext, record: &mut WorkflowRecord) -> Result<(), StageError> {
        let issue_key = record
            .issue_key()
            .ok_or_else(|| missing(StageId::Plan, "a verified identity"))?;
        let requirements = record
            .requirements()
            .ok_or_else(|| missing(StageId::Plan, "requirements"))?;

        let branch = format!(
            "{}{}-{}",
            ctx.config().git().branch_prefix(),
            issue_key.to_lowercase(),
            Utc::now().timestamp()
        );
        let plan = Plan {
            branch,
            targets: ordered_targets(requirements),
        };

        info!(branch = %plan.branch, targets = plan.targets.len(), "plan ready");
        let comment = format!(
            "Planned {} file changes on branch {}",
            plan.targets.len(),
            plan.branch
        );
        record.set_plan(plan);
        notify(ctx, record, IssueStatus::InProgress, comment);
        Ok(())
    }
}

/// Creations first, then modifications; a path appears once.
fn ordered_targets(requirements: &Requirements) -> Vec<PlanTarget> {
    let mut targets: Vec<PlanTarget> = Vec::new();
    let creates = requirements
        .files_to_create
        .iter()
        .map(|path| (path, TargetKind::Create));
    let modifies = requirements
        .files_to_modify
        .iter()
        .map(|path| (path, TargetKind::Modify));

    for (path, kind) in creates.chain(modifies) {
        if targets.iter().all(|t| t.path != *path) {
            targets.push(PlanTarget {
                path: path.clone(),
                kind,
            });
        }
    }
    targets
}
