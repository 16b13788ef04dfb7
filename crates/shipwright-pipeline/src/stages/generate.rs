use shipwright_core::{ErrorKind, IssueStatus, StageId, WorkflowRecord};
use tracing::{info, warn};

use super::{missing, notify};
use crate::context::PipelineContext;
use crate::error::StageError;
use crate::retry::with_retry;
use crate::stage::Stage;
use crate::traits::GenerationRequest;

/// Asks the code generator for file contents. Never touches the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateStage;

impl Stage for GenerateStage {
    fn id(&self) -> StageId {
        StageId::Generate
    }

    fn execute(&self, ctx: &PipelineContext, record: &mut WorkflowRecord) -> Result<(), StageError> {
        let identity = record
            .identity()
            .ok_or_else(|| missing(StageId::Generate, "a verified identity"))?;
        let requirements = record
            .requirements()
            .ok_or_else(|| missing(StageId::Generate, "requirements"))?;
        let plan = record
            .plan()
            .ok_or_else(|| missing(StageId::Generate, "a plan"))?;

        if plan.is_empty() {
            warn!("plan has no file targets");
            record.push_error(
                ErrorKind::Generation,
                "nothing to generate: analysis found no file targets",
            );
            notify(ctx, record, IssueStatus::Failed, "No code generated");
            return Ok(());
        }

        let result = with_retry(ctx.config().retry(), "generate", |attempt| {
            ctx.code_generator().generate(&GenerationRequest {
                project_root: ctx.project_root(),
                identity,
                requirements,
                plan,
                attempt,
            })
        });

        match result {
            Ok(files) => {
                let count = files.len();
                for (path, content) in files {
                    record.insert_artifact(path, content);
                }
                info!(files = count, "code generated");
                notify(
                    ctx,
                    record,
                    IssueStatus::CodeGenerated,
                    format!("Generated {count} files"),
                );
            }
            Err(failure) => {
                let kept = failure.partial.len();
                warn!(error = %failure, partial_files = kept, "code generation failed");
                for (path, content) in failure.partial {
                    record.insert_artifact(path, content);
                }
                record.push_error(
                    ErrorKind::Generation,
                    format!("code generation failed: {}", failure.message),
                );
                notify(
                    ctx,
                    record,
                    IssueStatus::Failed,
                    format!("Code generation failed, kept {kept} partial files"),
                );
            }
        }
        Ok(())
    }
}
