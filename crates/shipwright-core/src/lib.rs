pub mod audit;
pub mod change;
pub mod error;
pub mod event;
pub mod history;
pub mod record;
pub mod trace;
pub mod types;

pub use audit::{AuditCheck, AuditChecklist, OverallStatus, RunReport};
pub use change::{FileAction, FileChange};
pub use error::{RecordError, Result};
pub use event::{IngressEvent, InvalidEvent, IssueIdentity, MAX_ISSUE_KEY_LEN};
pub use history::{RunHistory, RunSummary};
pub use record::WorkflowRecord;
pub use trace::{IssueStatus, TraceEntry, TraceId};
pub use types::*;
