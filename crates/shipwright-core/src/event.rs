use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_ISSUE_KEY_LEN: usize = 64;

/// Ticket event as handed over by the ingress collaborator.
///
/// Fields are taken verbatim; nothing here is trusted until
/// [`IssueIdentity::verify`] accepts it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressEvent {
    #[serde(default)]
    pub issue_key: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, rename = "type")]
    pub issue_type: String,
    #[serde(default)]
    pub description: String,
}

impl IngressEvent {
    #[must_use]
    pub fn new(issue_key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            issue_key: issue_key.into(),
            summary: summary.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_type(mut self, issue_type: impl Into<String>) -> Self {
        self.issue_type = issue_type.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Every rule an event broke, collected rather than stopping at the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .problems.join("; "))]
pub struct InvalidEvent {
    pub problems: Vec<String>,
}

/// Verified issue identity. Once stored on a record it never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueIdentity {
    key: String,
    summary: String,
    issue_type: String,
    description: String,
}

impl IssueIdentity {
    /// Validates an ingress event and extracts its identity.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidEvent`] listing every violated rule when the issue key
    /// is empty, too long, does not start with an ASCII letter, or contains
    /// characters other than ASCII alphanumerics, `-` and `_`, or when the
    /// summary is blank.
    pub fn verify(event: &IngressEvent) -> Result<Self, InvalidEvent> {
        let key = event.issue_key.trim();
        let summary = event.summary.trim();
        let mut problems = Vec::new();

        if key.is_empty() {
            problems.push("missing issue key".to_string());
        } else {
            if key.len() > MAX_ISSUE_KEY_LEN {
                problems.push(format!(
                    "issue key is {} characters, limit is {MAX_ISSUE_KEY_LEN}",
                    key.len()
                ));
            }
            if !key.starts_with(|c: char| c.is_ascii_alphabetic()) {
                problems.push(format!("issue key '{key}' must start with a letter"));
            }
            if let Some(bad) = key
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
            {
                problems.push(format!("issue key '{key}' contains invalid character '{bad}'"));
            }
        }

        if summary.is_empty() {
            problems.push("missing issue summary".to_string());
        }

        if !problems.is_empty() {
            return Err(InvalidEvent { problems });
        }

        Ok(Self {
            key: key.to_string(),
            summary: summary.to_string(),
            issue_type: event.issue_type.trim().to_string(),
            description: event.description.clone(),
        })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    #[must_use]
    pub fn issue_type(&self) -> &str {
        &self.issue_type
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}
