use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shipwright_core::FileChange;

use crate::error::{Result, TxnError};

/// State of a path the first time a trace touched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub(crate) enum Original {
    Absent,
    Present { backup: PathBuf },
}

impl Original {
    pub(crate) fn backup(&self) -> Option<&Path> {
        match self {
            Self::Absent => None,
            Self::Present { backup } => Some(backup),
        }
    }
}

/// Per-trace bookkeeping persisted next to the trace's backup directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct TraceManifest {
    pub(crate) originals: BTreeMap<PathBuf, Original>,
    pub(crate) journal: Vec<FileChange>,
}

impl TraceManifest {
    pub(crate) fn load(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(TxnError::JournalRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| TxnError::JournalFormat {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Writes through a temporary file and renames it into place so a crash
    /// never leaves a truncated journal behind.
    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        let write_err = |source| TxnError::JournalWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| TxnError::JournalFormat {
            path: path.to_path_buf(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, path).map_err(write_err)
    }
}
