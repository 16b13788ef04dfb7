use std::path::{Path, PathBuf};

use shipwright_git::Repository;
use tracing::debug;

use crate::error::CollaboratorError;
use crate::traits::SourceHost;

/// Source host backed by the local git repository containing the project.
/// Branches and commits are local; pull requests are not supported.
pub struct LocalGitSourceHost {
    project_root: PathBuf,
}

impl LocalGitSourceHost {
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    fn open(&self) -> Result<Repository, CollaboratorError> {
        Ok(Repository::open(&self.project_root)?)
    }
}

impl SourceHost for LocalGitSourceHost {
    fn create_branch(&self, name: &str) -> Result<bool, CollaboratorError> {
        let repo = self.open()?;
        repo.create_branch(name)?;
        let current = repo.current_branch()?;
        if current != name {
            debug!(branch = name, current = %current, "HEAD did not move to the new branch");
        }
        Ok(current == name)
    }

    fn commit(&self, message: &str, paths: &[&Path]) -> Result<String, CollaboratorError> {
        let root = self
            .project_root
            .canonicalize()
            .unwrap_or_else(|_| self.project_root.clone());
        let absolute: Vec<PathBuf> = paths.iter().map(|path| root.join(path)).collect();
        let absolute: Vec<&Path> = absolute.iter().map(PathBuf::as_path).collect();

        let info = self.open()?.commit_paths(message, &absolute)?;
        Ok(info.sha)
    }

    fn create_pull_request(
        &self,
        branch: &str,
        _title: &str,
        _body: &str,
    ) -> Result<Option<String>, CollaboratorError> {
        debug!(branch, "local git host has no pull requests");
        Ok(None)
    }
}
