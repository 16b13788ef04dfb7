use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feature families recognised by requirements analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Export,
    Search,
    Notification,
    Styling,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Export => "export",
            Self::Search => "search",
            Self::Notification => "notification",
            Self::Styling => "styling",
        };
        write!(f, "{s}")
    }
}

/// Structured extraction of what an issue asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    pub features: Vec<Feature>,
    pub functional: Vec<String>,
    pub ui_changes: Vec<String>,
    pub technical: Vec<String>,
    pub files_to_create: Vec<PathBuf>,
    pub files_to_modify: Vec<PathBuf>,
}

impl Requirements {
    #[must_use]
    pub fn is_populated(&self) -> bool {
        !(self.functional.is_empty() && self.ui_changes.is_empty() && self.technical.is_empty())
    }

    #[must_use]
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Create,
    Modify,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTarget {
    pub path: PathBuf,
    pub kind: TargetKind,
}

/// Ordered file targets plus the branch the work lands on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub branch: String,
    pub targets: Vec<PlanTarget>,
}

impl Plan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Outcome of one test suite reported by the test runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub passed: u32,
    pub failed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl TestResult {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Verification,
    Generation,
    Persistence,
    Test,
    Deployment,
    SourceControl,
    Health,
    Framework,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Verification => "verification",
            Self::Generation => "generation",
            Self::Persistence => "persistence",
            Self::Test => "test",
            Self::Deployment => "deployment",
            Self::SourceControl => "source-control",
            Self::Health => "health",
            Self::Framework => "framework",
        };
        write!(f, "{s}")
    }
}

/// Human-readable failure recorded on a record, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RecordedError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Verify,
    Analyze,
    Plan,
    Generate,
    Persist,
    Test,
    Deploy,
    RollbackGuard,
    Audit,
}

impl StageId {
    /// Default linear order of the pipeline.
    pub const ALL: [Self; 9] = [
        Self::Verify,
        Self::Analyze,
        Self::Plan,
        Self::Generate,
        Self::Persist,
        Self::Test,
        Self::Deploy,
        Self::RollbackGuard,
        Self::Audit,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::Analyze => "analyze",
            Self::Plan => "plan",
            Self::Generate => "generate",
            Self::Persist => "persist",
            Self::Test => "test",
            Self::Deploy => "deploy",
            Self::RollbackGuard => "rollback_guard",
            Self::Audit => "audit",
        }
    }

    /// Position in the default linear order.
    #[must_use]
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageOutcome {
    Completed,
    Faulted,
    Skipped,
}

/// One entry of the engine's stage log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageVisit {
    pub stage: StageId,
    pub outcome: StageOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// What an automatic rollback did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackSummary {
    pub removed: usize,
    pub restored: usize,
    pub failures: Vec<String>,
}

impl RollbackSummary {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
