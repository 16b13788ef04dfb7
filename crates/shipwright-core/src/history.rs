use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::audit::OverallStatus;
use crate::error::{RecordError, Result};
use crate::record::WorkflowRecord;
use crate::trace::TraceId;

/// Condensed outcome of one finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub trace_id: TraceId,
    pub issue_key: Option<String>,
    pub overall_status: OverallStatus,
    pub success_rate: f64,
    pub files_changed: usize,
    pub errors: usize,
    pub rollback_triggered: bool,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// # Errors
    ///
    /// Returns [`RecordError::NotFinalized`] if the record has no report yet.
    pub fn from_record(record: &WorkflowRecord) -> Result<Self> {
        let report = record.report().ok_or(RecordError::NotFinalized {
            trace_id: record.trace_id(),
        })?;
        Ok(Self {
            trace_id: record.trace_id(),
            issue_key: record.issue_key().map(ToString::to_string),
            overall_status: report.overall_status,
            success_rate: report.success_rate,
            files_changed: record.file_changes().len(),
            errors: record.errors().len(),
            rollback_triggered: record.rollback_triggered(),
            finished_at: report.generated_at,
        })
    }
}

/// Caller-owned map of finished runs keyed by trace id, in completion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunHistory {
    runs: IndexMap<TraceId, RunSummary>,
}

impl RunHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns [`RecordError::DuplicateTrace`] if the trace is already present.
    pub fn insert(&mut self, summary: RunSummary) -> Result<()> {
        if self.runs.contains_key(&summary.trace_id) {
            return Err(RecordError::DuplicateTrace {
                trace_id: summary.trace_id,
            });
        }
        self.runs.insert(summary.trace_id, summary);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, trace_id: TraceId) -> bool {
        self.runs.contains_key(&trace_id)
    }

    #[must_use]
    pub fn get(&self, trace_id: TraceId) -> Option<&RunSummary> {
        self.runs.get(&trace_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunSummary> {
        self.runs.values()
    }

    pub fn for_issue<'a>(&'a self, issue_key: &'a str) -> impl Iterator<Item = &'a RunSummary> {
        self.runs
            .values()
            .filter(move |run| run.issue_key.as_deref() == Some(issue_key))
    }

    #[must_use]
    pub fn latest_for_issue(&self, issue_key: &str) -> Option<&RunSummary> {
        self.runs
            .values()
            .rev()
            .find(|run| run.issue_key.as_deref() == Some(issue_key))
    }
}
