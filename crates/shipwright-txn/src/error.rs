use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxnError {
    #[error("path '{path}' escapes the project root")]
    OutsideProject { path: PathBuf },

    #[error("'{path}' does not exist")]
    NotFound { path: PathBuf },

    #[error("failed to back up '{path}'")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}'")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove '{path}'")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to restore '{path}' from '{backup}'")]
    Restore {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backup '{backup}' for '{path}' is missing")]
    MissingBackup { path: PathBuf, backup: PathBuf },

    #[error("failed to read journal '{path}'")]
    JournalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write journal '{path}'")]
    JournalWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("journal '{path}' is malformed")]
    JournalFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, TxnError>;
