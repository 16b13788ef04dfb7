use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use shipwright_core::{IssueIdentity, Plan, Requirements};
use thiserror::Error;

/// Target path to file content, in plan order.
pub type GeneratedFiles = IndexMap<PathBuf, String>;

/// Everything a generator may look at for one attempt.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub project_root: &'a Path,
    pub identity: &'a IssueIdentity,
    pub requirements: &'a Requirements,
    pub plan: &'a Plan,
    /// One-based attempt number under the retry policy.
    pub attempt: u32,
}

/// A failed generation attempt, possibly with the files it managed to
/// produce before failing.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct GenerationFailure {
    pub message: String,
    pub partial: GeneratedFiles,
}

impl GenerationFailure {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            partial: GeneratedFiles::new(),
        }
    }

    #[must_use]
    pub fn with_partial(mut self, partial: GeneratedFiles) -> Self {
        self.partial = partial;
        self
    }
}

/// Produces file contents from requirements. Never writes to disk.
pub trait CodeGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`GenerationFailure`] carrying any partial output.
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedFiles, GenerationFailure>;
}
