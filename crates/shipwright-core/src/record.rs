use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::audit::{OverallStatus, RunReport};
use crate::change::FileChange;
use crate::error::{RecordError, Result};
use crate::event::{IngressEvent, IssueIdentity};
use crate::trace::{IssueStatus, TraceEntry, TraceId};
use crate::types::{
    ErrorKind, Plan, RecordedError, Requirements, RollbackSummary, StageVisit, TestResult,
};

/// Per-event state threaded through every stage of a run.
///
/// The trace id is fixed at construction. The change list, error list, trace
/// log and stage log only grow. Once [`finalize`](Self::finalize) has stored
/// the report the record is terminal and the engine refuses to run it again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRecord {
    trace_id: TraceId,
    event: IngressEvent,
    identity: Option<IssueIdentity>,
    requirements: Option<Requirements>,
    plan: Option<Plan>,
    generated_artifacts: IndexMap<PathBuf, String>,
    file_changes: Vec<FileChange>,
    test_suite: IndexMap<PathBuf, String>,
    test_results: Vec<TestResult>,
    verification_passed: bool,
    tests_passed: bool,
    deployment_attempted: bool,
    deployment_successful: bool,
    rollback_triggered: bool,
    commit_id: Option<String>,
    pr_url: Option<String>,
    deployment_url: Option<String>,
    rollback: Option<RollbackSummary>,
    errors: Vec<RecordedError>,
    trace_log: Vec<TraceEntry>,
    stage_log: Vec<StageVisit>,
    report: Option<RunReport>,
}

impl WorkflowRecord {
    #[must_use]
    pub fn new(event: IngressEvent) -> Self {
        Self::with_trace_id(TraceId::new(), event)
    }

    /// Creates a record under a caller-chosen trace id, e.g. when resuming
    /// bookkeeping for an abandoned run.
    #[must_use]
    pub fn with_trace_id(trace_id: TraceId, event: IngressEvent) -> Self {
        Self {
            trace_id,
            event,
            identity: None,
            requirements: None,
            plan: None,
            generated_artifacts: IndexMap::new(),
            file_changes: Vec::new(),
            test_suite: IndexMap::new(),
            test_results: Vec::new(),
            verification_passed: false,
            tests_passed: false,
            deployment_attempted: false,
            deployment_successful: false,
            rollback_triggered: false,
            commit_id: None,
            pr_url: None,
            deployment_url: None,
            rollback: None,
            errors: Vec::new(),
            trace_log: Vec::new(),
            stage_log: Vec::new(),
            report: None,
        }
    }

    #[must_use]
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    #[must_use]
    pub fn event(&self) -> &IngressEvent {
        &self.event
    }

    #[must_use]
    pub fn identity(&self) -> Option<&IssueIdentity> {
        self.identity.as_ref()
    }

    /// Issue key once verified.
    #[must_use]
    pub fn issue_key(&self) -> Option<&str> {
        self.identity.as_ref().map(IssueIdentity::key)
    }

    /// Stores the verified identity.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::IdentityAlreadySet`] if an identity was stored
    /// before.
    pub fn set_identity(&mut self, identity: IssueIdentity) -> Result<()> {
        if self.identity.is_some() {
            return Err(RecordError::IdentityAlreadySet {
                trace_id: self.trace_id,
            });
        }
        self.identity = Some(identity);
        Ok(())
    }

    #[must_use]
    pub fn requirements(&self) -> Option<&Requirements> {
        self.requirements.as_ref()
    }

    pub fn set_requirements(&mut self, requirements: Requirements) {
        self.requirements = Some(requirements);
    }

    #[must_use]
    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn set_plan(&mut self, plan: Plan) {
        self.plan = Some(plan);
    }

    #[must_use]
    pub fn generated_artifacts(&self) -> &IndexMap<PathBuf, String> {
        &self.generated_artifacts
    }

    /// Stores generated content for a target; a repeated path replaces the
    /// earlier content in place.
    pub fn insert_artifact(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.generated_artifacts.insert(path.into(), content.into());
    }

    #[must_use]
    pub fn file_changes(&self) -> &[FileChange] {
        &self.file_changes
    }

    pub fn push_file_change(&mut self, change: FileChange) {
        self.file_changes.push(change);
    }

    /// Number of changes that left content on disk.
    #[must_use]
    pub fn files_written(&self) -> usize {
        self.file_changes.iter().filter(|c| c.is_write()).count()
    }

    #[must_use]
    pub fn test_suite(&self) -> &IndexMap<PathBuf, String> {
        &self.test_suite
    }

    pub fn set_test_suite(&mut self, suite: IndexMap<PathBuf, String>) {
        self.test_suite = suite;
    }

    #[must_use]
    pub fn test_results(&self) -> &[TestResult] {
        &self.test_results
    }

    pub fn set_test_results(&mut self, results: Vec<TestResult>) {
        self.test_results = results;
    }

    #[must_use]
    pub fn verification_passed(&self) -> bool {
        self.verification_passed
    }

    pub fn set_verification_passed(&mut self, passed: bool) {
        self.verification_passed = passed;
    }

    #[must_use]
    pub fn tests_passed(&self) -> bool {
        self.tests_passed
    }

    pub fn set_tests_passed(&mut self, passed: bool) {
        self.tests_passed = passed;
    }

    #[must_use]
    pub fn deployment_attempted(&self) -> bool {
        self.deployment_attempted
    }

    pub fn mark_deployment_attempted(&mut self) {
        self.deployment_attempted = true;
    }

    #[must_use]
    pub fn deployment_successful(&self) -> bool {
        self.deployment_successful
    }

    pub fn set_deployment_successful(&mut self, successful: bool) {
        self.deployment_successful = successful;
    }

    #[must_use]
    pub fn rollback_triggered(&self) -> bool {
        self.rollback_triggered
    }

    #[must_use]
    pub fn rollback(&self) -> Option<&RollbackSummary> {
        self.rollback.as_ref()
    }

    /// Records that every change in the list has been reversed.
    pub fn record_rollback(&mut self, summary: RollbackSummary) {
        self.rollback_triggered = true;
        self.rollback = Some(summary);
    }

    #[must_use]
    pub fn commit_id(&self) -> Option<&str> {
        self.commit_id.as_deref()
    }

    pub fn set_commit_id(&mut self, commit_id: impl Into<String>) {
        self.commit_id = Some(commit_id.into());
    }

    #[must_use]
    pub fn pr_url(&self) -> Option<&str> {
        self.pr_url.as_deref()
    }

    pub fn set_pr_url(&mut self, url: impl Into<String>) {
        self.pr_url = Some(url.into());
    }

    #[must_use]
    pub fn deployment_url(&self) -> Option<&str> {
        self.deployment_url.as_deref()
    }

    pub fn set_deployment_url(&mut self, url: impl Into<String>) {
        self.deployment_url = Some(url.into());
    }

    #[must_use]
    pub fn errors(&self) -> &[RecordedError] {
        &self.errors
    }

    pub fn push_error(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.errors.push(RecordedError::new(kind, message));
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    #[must_use]
    pub fn trace_log(&self) -> &[TraceEntry] {
        &self.trace_log
    }

    /// Appends an entry to the audit trail and returns it.
    pub fn push_trace(&mut self, status: IssueStatus, comment: impl Into<String>) -> &TraceEntry {
        self.trace_log.push(TraceEntry::now(status, comment));
        &self.trace_log[self.trace_log.len() - 1]
    }

    #[must_use]
    pub fn stage_log(&self) -> &[StageVisit] {
        &self.stage_log
    }

    pub fn push_stage_visit(&mut self, visit: StageVisit) {
        self.stage_log.push(visit);
    }

    #[must_use]
    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    #[must_use]
    pub fn overall_status(&self) -> Option<OverallStatus> {
        self.report.as_ref().map(|r| r.overall_status)
    }

    #[must_use]
    pub fn is_final(&self) -> bool {
        self.report.is_some()
    }

    /// Stores the audit verdict, making the record terminal.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::AlreadyFinalized`] if a report was stored
    /// before.
    pub fn finalize(&mut self, report: RunReport) -> Result<()> {
        if self.report.is_some() {
            return Err(RecordError::AlreadyFinalized {
                trace_id: self.trace_id,
            });
        }
        self.report = Some(report);
        Ok(())
    }
}
