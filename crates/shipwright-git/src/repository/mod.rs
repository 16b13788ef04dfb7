mod branch;
mod commit;
mod staging;
mod status;

use std::path::{Path, PathBuf};

use crate::{GitError, Result};

/// The git repository that contains a project directory.
pub struct Repository {
    pub(crate) inner: git2::Repository,
    workdir: PathBuf,
}

impl Repository {
    /// Finds the repository containing `path`, searching parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NotARepository`] when no repository encloses `path`
    /// and [`GitError::BareRepository`] when the one found has no work tree.
    pub fn open(path: &Path) -> Result<Self> {
        let Ok(inner) = git2::Repository::discover(path) else {
            return Err(GitError::NotARepository {
                path: path.to_path_buf(),
            });
        };
        let Some(workdir) = inner.workdir().map(dunce::simplified) else {
            return Err(GitError::BareRepository {
                path: inner.path().to_path_buf(),
            });
        };
        let workdir = dunce::canonicalize(workdir).unwrap_or_else(|_| workdir.to_path_buf());

        Ok(Self { inner, workdir })
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Work-tree-relative form of `path`. Relative paths are taken as
    /// already relative to the work tree.
    pub(crate) fn relative_path(&self, path: &Path) -> Result<PathBuf> {
        if path.is_relative() {
            return Ok(path.to_path_buf());
        }
        dunce::simplified(path)
            .strip_prefix(&self.workdir)
            .map(Path::to_path_buf)
            .map_err(|_| GitError::OutsideWorkdir {
                path: path.to_path_buf(),
            })
    }
}
