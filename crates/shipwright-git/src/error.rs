use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git operation failed")]
    Git(#[from] git2::Error),

    #[error("not a git repository: '{}'", path.display())]
    NotARepository { path: PathBuf },

    #[error("repository at '{}' has no work tree", path.display())]
    BareRepository { path: PathBuf },

    #[error("'{}' is outside the repository work tree", path.display())]
    OutsideWorkdir { path: PathBuf },

    #[error("'{name}' is not a valid branch name")]
    InvalidBranchName { name: String },

    #[error("branch '{name}' already exists on a different commit")]
    BranchDiverged { name: String },

    #[error("HEAD is detached, not on a branch")]
    DetachedHead,

    #[error("nothing to commit")]
    NothingToCommit,
}
