use shipwright_core::{ErrorKind, IssueIdentity, IssueStatus, StageId, WorkflowRecord};
use tracing::{info, warn};

use super::notify;
use crate::context::PipelineContext;
use crate::error::StageError;
use crate::stage::Stage;

/// Validates the ingress event and fixes the record's identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyStage;

impl Stage for VerifyStage {
    fn id(&self) -> StageId {
        StageId::Verify
    }

    fn execute(&self, ctx: &PipelineContext, record: &mut WorkflowRecord) -> Result<(), StageError> {
        match IssueIdentity::verify(record.event()) {
            Ok(identity) => {
                let comment = format!("Pipeline started: {}", identity.summary());
                info!(issue_key = identity.key(), "event verified");
                record.set_identity(identity)?;
                record.set_verification_passed(true);
                notify(ctx, record, IssueStatus::InProgress, comment);
            }
            Err(invalid) => {
                warn!(problems = %invalid, "event rejected");
                record.set_verification_passed(false);
                record.push_error(ErrorKind::Verification, format!("event rejected: {invalid}"));
                notify(ctx, record, IssueStatus::Failed, "Verification failed");
            }
        }
        Ok(())
    }
}
