use std::time::Duration;

use shipwright_core::{RecordError, StageId, TraceId};
use shipwright_git::GitError;
use shipwright_report::ReportError;
use shipwright_txn::TxnError;
use thiserror::Error;

/// Failure reported by an external collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("failed to run command '{command}'")]
    CommandIo {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command '{command}' did not finish within {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },

    #[error("command '{command}' exited with {status}: {output}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    #[error("{0}")]
    Rejected(String),
}

/// Unexpected failure inside a stage. The engine records it as a framework
/// fault and routes the record to audit.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Transaction(#[from] TxnError),

    #[error("stage '{stage}' needs {what}, which no earlier stage produced")]
    MissingInput { stage: StageId, what: &'static str },

    #[error("refusing to touch the filesystem for unverified trace {trace_id}")]
    Unverified { trace_id: TraceId },
}

/// Sequencing failure of the engine itself; the only error that reaches the
/// caller of a run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("trace {trace_id} already reached audit and cannot run again")]
    AlreadyFinalized { trace_id: TraceId },

    #[error("no stage registered for '{stage}'")]
    StageNotRegistered { stage: StageId },

    #[error("invalid transition table: {reason}")]
    InvalidTransitions { reason: String },
}
