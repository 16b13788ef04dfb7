use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of one pipeline run.
///
/// Assigned once when a [`WorkflowRecord`](crate::WorkflowRecord) is created
/// and used to scope every backup the run takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(Uuid);

impl TraceId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Issue-tracker workflow status attached to each trace-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueStatus {
    ToDo,
    InProgress,
    CodeGenerated,
    InReview,
    ReadyForQa,
    Deployed,
    Failed,
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::CodeGenerated => "Code Generated",
            Self::InReview => "In Review",
            Self::ReadyForQa => "Ready for QA",
            Self::Deployed => "Deployed",
            Self::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

/// One entry of a record's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub status: IssueStatus,
    pub timestamp: DateTime<Utc>,
    pub comment: String,
}

impl TraceEntry {
    #[must_use]
    pub fn now(status: IssueStatus, comment: impl Into<String>) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
            comment: comment.into(),
        }
    }
}
