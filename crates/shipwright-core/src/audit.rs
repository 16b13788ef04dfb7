use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::change::FileAction;
use crate::record::WorkflowRecord;

const SUCCESS_THRESHOLD: f64 = 0.90;
const PARTIAL_SUCCESS_THRESHOLD: f64 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Success,
    PartialSuccess,
    Failed,
    CriticalFailure,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "SUCCESS",
            Self::PartialSuccess => "PARTIAL_SUCCESS",
            Self::Failed => "FAILED",
            Self::CriticalFailure => "CRITICAL_FAILURE",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditCheck {
    pub name: String,
    pub passed: bool,
}

/// Fixed checklist computed from a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditChecklist {
    checks: Vec<AuditCheck>,
    critical: bool,
    /// No recorded errors and no rollback.
    #[serde(default)]
    clean: bool,
}

impl AuditChecklist {
    #[must_use]
    pub fn from_record(record: &WorkflowRecord) -> Self {
        let code_generated = !record.generated_artifacts().is_empty();
        let files_written = record.files_written() > 0;
        let backups_present = record
            .file_changes()
            .iter()
            .filter(|c| c.action() == FileAction::Modified)
            .all(|c| c.backup_path().is_some_and(|p| !p.as_os_str().is_empty()));

        let checks = [
            ("verification passed", record.verification_passed()),
            (
                "requirements populated",
                record.requirements().is_some_and(|r| r.is_populated()),
            ),
            ("code generated", code_generated),
            ("files written", files_written),
            ("tests created", !record.test_suite().is_empty()),
            ("tests passed", record.tests_passed()),
            ("deployment attempted", record.deployment_attempted()),
            ("trace log non-empty", !record.trace_log().is_empty()),
            ("backups exist when needed", backups_present),
        ]
        .into_iter()
        .map(|(name, passed)| AuditCheck {
            name: name.to_string(),
            passed,
        })
        .collect();

        Self {
            checks,
            critical: !record.verification_passed() || !code_generated || !files_written,
            clean: !record.has_errors() && !record.rollback_triggered(),
        }
    }

    #[must_use]
    pub fn checks(&self) -> &[AuditCheck] {
        &self.checks
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.checks.is_empty() {
            return 0.0;
        }
        self.passed() as f64 / self.total() as f64
    }

    /// True when verification failed, nothing was generated, or nothing was
    /// written.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// True when the run recorded no errors and was not rolled back.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.clean
    }

    /// Critical failures win over any success rate. A run with errors or a
    /// rollback is at best a partial success.
    #[must_use]
    pub fn overall_status(&self) -> OverallStatus {
        if self.critical {
            return OverallStatus::CriticalFailure;
        }
        let rate = self.success_rate();
        if rate >= SUCCESS_THRESHOLD && self.clean {
            OverallStatus::Success
        } else if rate >= SUCCESS_THRESHOLD {
            OverallStatus::PartialSuccess
        } else if rate >= PARTIAL_SUCCESS_THRESHOLD {
            OverallStatus::PartialSuccess
        } else {
            OverallStatus::Failed
        }
    }
}

/// Terminal verdict stored on a record by the audit stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub overall_status: OverallStatus,
    pub success_rate: f64,
    pub checklist: AuditChecklist,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
    pub generated_at: DateTime<Utc>,
}

impl RunReport {
    #[must_use]
    pub fn score(record: &WorkflowRecord, report_path: Option<PathBuf>) -> Self {
        Self::from_checklist(AuditChecklist::from_record(record), report_path)
    }

    #[must_use]
    pub fn from_checklist(checklist: AuditChecklist, report_path: Option<PathBuf>) -> Self {
        Self {
            overall_status: checklist.overall_status(),
            success_rate: checklist.success_rate(),
            checklist,
            report_path,
            generated_at: Utc::now(),
        }
    }
}
