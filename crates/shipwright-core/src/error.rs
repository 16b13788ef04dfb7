use thiserror::Error;

use crate::trace::TraceId;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("issue identity for trace {trace_id} is already set")]
    IdentityAlreadySet { trace_id: TraceId },

    #[error("record {trace_id} is already finalized")]
    AlreadyFinalized { trace_id: TraceId },

    #[error("record {trace_id} has not been audited")]
    NotFinalized { trace_id: TraceId },

    #[error("run history already contains trace {trace_id}")]
    DuplicateTrace { trace_id: TraceId },
}

pub type Result<T> = std::result::Result<T, RecordError>;
