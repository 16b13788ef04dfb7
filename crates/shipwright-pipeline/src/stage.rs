use shipwright_core::{StageId, WorkflowRecord};

use crate::context::PipelineContext;
use crate::error::StageError;

/// One unit of pipeline work.
///
/// Expected failures are recorded on the record (an error entry plus the
/// stage's flag) and the stage returns `Ok`. An `Err` or a panic is a
/// framework fault: the engine records it and routes the record to audit.
pub trait Stage: Send + Sync {
    fn id(&self) -> StageId;

    /// # Errors
    ///
    /// Returns a [`StageError`] only for faults the stage cannot express as
    /// a recorded failure.
    fn execute(&self, ctx: &PipelineContext, record: &mut WorkflowRecord) -> Result<(), StageError>;
}
