use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use chrono::Utc;
use shipwright_core::{
    ErrorKind, RecordError, RunHistory, RunReport, RunSummary, StageId, StageOutcome, StageVisit,
    WorkflowRecord,
};
use tracing::{error, info, info_span, warn};

use crate::context::PipelineContext;
use crate::error::EngineError;
use crate::stage::Stage;
use crate::stages::standard_stages;
use crate::transition::TransitionTable;

/// Runs records through the stage registry along the transition table.
///
/// One engine may run many records concurrently from different threads; a
/// single record is always processed sequentially.
pub struct PipelineEngine {
    context: PipelineContext,
    stages: HashMap<StageId, Box<dyn Stage>>,
    transitions: TransitionTable,
}

impl PipelineEngine {
    /// Engine with the nine standard stages and the standard table.
    #[must_use]
    pub fn new(context: PipelineContext) -> Self {
        Self::from_stages(context, standard_stages())
    }

    /// Engine with an explicit registry; a later stage replaces an earlier
    /// one with the same id.
    #[must_use]
    pub fn from_stages(context: PipelineContext, stages: Vec<Box<dyn Stage>>) -> Self {
        let stages = stages
            .into_iter()
            .map(|stage| (stage.id(), stage))
            .collect();
        Self {
            context,
            stages,
            transitions: TransitionTable::standard(),
        }
    }

    /// Replaces the registered stage with the same id.
    #[must_use]
    pub fn with_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.insert(stage.id(), stage);
        self
    }

    #[must_use]
    pub fn with_transitions(mut self, transitions: TransitionTable) -> Self {
        self.transitions = transitions;
        self
    }

    #[must_use]
    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    #[must_use]
    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Runs `record` to audit and returns it finalized.
    ///
    /// Stage failures never surface here: they are recorded on the record
    /// and the run still ends in exactly one audit.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyFinalized`] for a record that already
    /// reached audit, and [`EngineError::StageNotRegistered`] if the table
    /// names a stage the registry lacks.
    pub fn run(&self, mut record: WorkflowRecord) -> Result<WorkflowRecord, EngineError> {
        if record.is_final() {
            return Err(EngineError::AlreadyFinalized {
                trace_id: record.trace_id(),
            });
        }
        for stage in self.transitions.stages() {
            if !self.stages.contains_key(stage) {
                return Err(EngineError::StageNotRegistered { stage: *stage });
            }
        }

        let span = info_span!(
            "pipeline",
            trace_id = %record.trace_id(),
            issue_key = %record.event().issue_key
        );
        let _entered = span.enter();
        info!("pipeline run started");

        let terminal = self.transitions.terminal();
        let mut current = self.transitions.start();
        loop {
            let outcome = self.execute_stage(current, &mut record)?;
            if current == terminal {
                break;
            }

            let next = if outcome == StageOutcome::Faulted {
                terminal
            } else {
                self.transitions.next(current, &record).unwrap_or(terminal)
            };
            self.mark_skipped(current, next, &mut record);
            current = next;
        }

        let finalized = if record.is_final() {
            Ok(())
        } else {
            warn!("audit did not finalize the record, scoring it directly");
            let report = RunReport::score(&record, None);
            record.finalize(report)
        };
        self.context.files().release(record.trace_id());
        finalized?;

        info!(
            status = ?record.overall_status(),
            errors = record.errors().len(),
            rollback = record.rollback_triggered(),
            "pipeline run finished"
        );
        Ok(record)
    }

    /// Runs `record` and files its summary into the caller's history.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Record`] if the trace is already in `history`
    /// (checked before anything runs), plus everything [`run`](Self::run)
    /// returns.
    pub fn run_recorded(
        &self,
        history: &mut RunHistory,
        record: WorkflowRecord,
    ) -> Result<WorkflowRecord, EngineError> {
        if history.contains(record.trace_id()) {
            return Err(EngineError::Record(RecordError::DuplicateTrace {
                trace_id: record.trace_id(),
            }));
        }
        let record = self.run(record)?;
        history.insert(RunSummary::from_record(&record)?)?;
        Ok(record)
    }

    fn execute_stage(
        &self,
        id: StageId,
        record: &mut WorkflowRecord,
    ) -> Result<StageOutcome, EngineError> {
        let stage = self
            .stages
            .get(&id)
            .ok_or(EngineError::StageNotRegistered { stage: id })?;

        let span = info_span!("stage", stage = %id);
        let _entered = span.enter();
        let started_at = Utc::now();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            stage.execute(&self.context, record)
        }));
        let fault = match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(payload) => Some(format!("panicked: {}", panic_message(payload.as_ref()))),
        };

        let outcome = if let Some(fault) = fault {
            error!(fault = %fault, "stage faulted");
            record.push_error(ErrorKind::Framework, format!("stage {id} faulted: {fault}"));
            StageOutcome::Faulted
        } else {
            StageOutcome::Completed
        };

        record.push_stage_visit(StageVisit {
            stage: id,
            outcome,
            started_at,
            finished_at: Utc::now(),
        });
        Ok(outcome)
    }

    fn mark_skipped(&self, from: StageId, to: StageId, record: &mut WorkflowRecord) {
        let skipped = self.transitions.skipped_between(from, to);
        if skipped.is_empty() {
            return;
        }
        warn!(from = %from, to = %to, skipped = skipped.len(), "checkpoint skipped stages");
        let now = Utc::now();
        for stage in skipped {
            record.push_stage_visit(StageVisit {
                stage: *stage,
                outcome: StageOutcome::Skipped,
                started_at: now,
                finished_at: now,
            });
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
