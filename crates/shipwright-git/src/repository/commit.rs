use std::path::Path;

use crate::{CommitInfo, GitError, Result};

use super::Repository;

impl Repository {
    /// # Errors
    ///
    /// Returns [`GitError::NothingToCommit`] if the index matches HEAD, or an
    /// error if the commit cannot be created.
    pub fn commit(&self, message: &str) -> Result<CommitInfo> {
        let sig = self.inner.signature()?;
        let mut index = self.inner.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;

        let parent = self.inner.head().ok().and_then(|h| h.peel_to_commit().ok());
        if parent.as_ref().is_some_and(|p| p.tree_id() == tree_id) {
            return Err(GitError::NothingToCommit);
        }

        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let commit_oid = self
            .inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;

        Ok(CommitInfo {
            sha: commit_oid.to_string(),
            message: message.to_string(),
        })
    }

    /// Stages `paths` (additions, edits and deletions alike) and commits them.
    ///
    /// # Errors
    ///
    /// Returns an error if staging fails or there is nothing to commit.
    pub fn commit_paths(&self, message: &str, paths: &[&Path]) -> Result<CommitInfo> {
        self.stage_files(paths)?;
        self.commit(message)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup_test_repo;
    use crate::GitError;
    use std::fs;
    use std::path::Path;

    #[test]
    fn create_commit() -> anyhow::Result<()> {
        let (dir, repo) = setup_test_repo()?;

        fs::write(dir.path().join("file.txt"), "content")?;
        repo.stage_files(&[Path::new("file.txt")])?;

        let commit_info = repo.commit("Test commit message")?;

        assert!(!commit_info.sha.is_empty());
        assert_eq!(commit_info.message, "Test commit message");

        let head = repo.inner.head()?.peel_to_commit()?;
        assert_eq!(head.id().to_string(), commit_info.sha);

        Ok(())
    }

    #[test]
    fn commit_paths_stages_and_commits() -> anyhow::Result<()> {
        let (dir, repo) = setup_test_repo()?;
        fs::create_dir_all(dir.path().join("src/components"))?;
        fs::write(dir.path().join("src/components/SearchBar.jsx"), "x")?;

        let info = repo.commit_paths(
            "SHIP-1: Add search",
            &[Path::new("src/components/SearchBar.jsx")],
        )?;

        let head = repo.inner.head()?.peel_to_commit()?;
        assert_eq!(head.id().to_string(), info.sha);
        assert!(head
            .tree()?
            .get_path(Path::new("src/components/SearchBar.jsx"))
            .is_ok());
        Ok(())
    }

    #[test]
    fn empty_commit_is_rejected() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;

        let result = repo.commit("nothing changed");

        assert!(matches!(result, Err(GitError::NothingToCommit)));
        Ok(())
    }
}
