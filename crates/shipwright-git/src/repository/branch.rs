use crate::{GitError, Result};

use super::Repository;

impl Repository {
    /// Creates `name` at the current HEAD commit and switches HEAD to it.
    ///
    /// The working tree is left untouched. Calling it again for a branch that
    /// already points at HEAD just switches to it, so retries are harmless.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::InvalidBranchName`] for names git rejects and
    /// [`GitError::BranchDiverged`] if the branch exists on another commit.
    pub fn create_branch(&self, name: &str) -> Result<()> {
        if !git2::Branch::name_is_valid(name)? {
            return Err(GitError::InvalidBranchName {
                name: name.to_string(),
            });
        }
        let refname = format!("refs/heads/{name}");

        let head_commit = match self.inner.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };

        if let Some(commit) = head_commit {
            match self.inner.find_branch(name, git2::BranchType::Local) {
                Ok(existing) => {
                    if existing.get().target() != Some(commit.id()) {
                        return Err(GitError::BranchDiverged {
                            name: name.to_string(),
                        });
                    }
                }
                Err(e) if e.code() == git2::ErrorCode::NotFound => {
                    self.inner.branch(name, &commit, false)?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.inner.set_head(&refname)?;
        Ok(())
    }
}
