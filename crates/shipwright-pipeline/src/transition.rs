use shipwright_core::{StageId, WorkflowRecord};

use crate::error::EngineError;

/// Predicate evaluated at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    VerificationFailed,
    NoFilesWritten,
    TestsFailed,
}

impl Guard {
    #[must_use]
    pub fn holds(self, record: &WorkflowRecord) -> bool {
        match self {
            Self::VerificationFailed => !record.verification_passed(),
            Self::NoFilesWritten => record.files_written() == 0,
            Self::TestsFailed => !record.tests_passed(),
        }
    }
}

/// Conditional edge: after `after` completes, jump to `target` if `guard`
/// holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub after: StageId,
    pub guard: Guard,
    pub target: StageId,
}

/// Linear stage order plus checkpoint edges.
///
/// Every edge points strictly forward and the last stage is terminal, so any
/// walk of the table reaches the terminal stage exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    order: Vec<StageId>,
    checkpoints: Vec<Checkpoint>,
}

impl TransitionTable {
    /// `verify → … → audit` with the three standard checkpoints.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            order: StageId::ALL.to_vec(),
            checkpoints: vec![
                Checkpoint {
                    after: StageId::Verify,
                    guard: Guard::VerificationFailed,
                    target: StageId::Audit,
                },
                Checkpoint {
                    after: StageId::Persist,
                    guard: Guard::NoFilesWritten,
                    target: StageId::Audit,
                },
                Checkpoint {
                    after: StageId::Test,
                    guard: Guard::TestsFailed,
                    target: StageId::Audit,
                },
            ],
        }
    }

    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransitions`] if the order is empty,
    /// repeats a stage, does not end in audit, or a checkpoint refers to an
    /// unknown stage or does not point forward.
    pub fn new(order: Vec<StageId>, checkpoints: Vec<Checkpoint>) -> Result<Self, EngineError> {
        let table = Self { order, checkpoints };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), EngineError> {
        let invalid = |reason: String| EngineError::InvalidTransitions { reason };

        if self.order.last() != Some(&StageId::Audit) {
            return Err(invalid("the stage order must end with audit".to_string()));
        }
        for (i, stage) in self.order.iter().enumerate() {
            if self.order[..i].contains(stage) {
                return Err(invalid(format!("stage '{stage}' appears twice")));
            }
        }
        for checkpoint in &self.checkpoints {
            let from = self.position(checkpoint.after).ok_or_else(|| {
                invalid(format!("checkpoint after unknown stage '{}'", checkpoint.after))
            })?;
            let to = self.position(checkpoint.target).ok_or_else(|| {
                invalid(format!("checkpoint targets unknown stage '{}'", checkpoint.target))
            })?;
            if to <= from {
                return Err(invalid(format!(
                    "checkpoint {} -> {} does not point forward",
                    checkpoint.after, checkpoint.target
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn stages(&self) -> &[StageId] {
        &self.order
    }

    #[must_use]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// First stage of a run.
    #[must_use]
    pub fn start(&self) -> StageId {
        self.order.first().copied().unwrap_or(StageId::Audit)
    }

    #[must_use]
    pub fn terminal(&self) -> StageId {
        StageId::Audit
    }

    /// Stage that follows `current` for this record, or `None` at the end.
    /// The first checkpoint after `current` whose guard holds wins.
    #[must_use]
    pub fn next(&self, current: StageId, record: &WorkflowRecord) -> Option<StageId> {
        if let Some(checkpoint) = self
            .checkpoints
            .iter()
            .find(|c| c.after == current && c.guard.holds(record))
        {
            return Some(checkpoint.target);
        }
        let position = self.position(current)?;
        self.order.get(position + 1).copied()
    }

    /// Stages strictly between `from` and `to` in the linear order.
    #[must_use]
    pub fn skipped_between(&self, from: StageId, to: StageId) -> &[StageId] {
        match (self.position(from), self.position(to)) {
            (Some(from), Some(to)) if to > from + 1 => &self.order[from + 1..to],
            _ => &[],
        }
    }

    /// Every edge of the table: linear successors (no guard) and checkpoint
    /// jumps.
    #[must_use]
    pub fn edges(&self) -> Vec<(StageId, StageId, Option<Guard>)> {
        let linear = self
            .order
            .windows(2)
            .map(|pair| (pair[0], pair[1], None));
        let jumps = self
            .checkpoints
            .iter()
            .map(|c| (c.after, c.target, Some(c.guard)));
        linear.chain(jumps).collect()
    }

    fn position(&self, stage: StageId) -> Option<usize> {
        self.order.iter().position(|s| *s == stage)
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}
