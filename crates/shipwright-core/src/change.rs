use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Created,
    Modified,
    Deleted,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        };
        write!(f, "{s}")
    }
}

/// One recorded file mutation.
///
/// The constructors tie the backup to the action: a `created` change never
/// has a backup and a `modified` change always does, because the target
/// existed before the mutation. A `deleted` change has one unless the file
/// was created earlier in the same run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    path: PathBuf,
    action: FileAction,
    lines_added: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backup_path: Option<PathBuf>,
}

impl FileChange {
    #[must_use]
    pub fn created(path: impl Into<PathBuf>, lines_added: usize) -> Self {
        Self {
            path: path.into(),
            action: FileAction::Created,
            lines_added,
            backup_path: None,
        }
    }

    #[must_use]
    pub fn modified(
        path: impl Into<PathBuf>,
        lines_added: usize,
        backup_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            path: path.into(),
            action: FileAction::Modified,
            lines_added,
            backup_path: Some(backup_path.into()),
        }
    }

    #[must_use]
    pub fn deleted(path: impl Into<PathBuf>, backup_path: Option<PathBuf>) -> Self {
        Self {
            path: path.into(),
            action: FileAction::Deleted,
            lines_added: 0,
            backup_path,
        }
    }

    /// Path of the target, relative to the project root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn action(&self) -> FileAction {
        self.action
    }

    #[must_use]
    pub fn lines_added(&self) -> usize {
        self.lines_added
    }

    #[must_use]
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    /// True for changes that leave content on disk (`created` or `modified`).
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self.action, FileAction::Created | FileAction::Modified)
    }
}
