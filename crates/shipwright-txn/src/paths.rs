use std::path::{Component, Path, PathBuf};

use crate::error::{Result, TxnError};

/// Reduces `path` to a clean path relative to `root`.
///
/// Absolute paths must lie under `root`. `..`, root and prefix components are
/// rejected so a relative path can be replayed under the backup area without
/// escaping it.
pub(crate) fn relative_to(root: &Path, path: &Path) -> Result<PathBuf> {
    let candidate = if path.is_absolute() {
        path.strip_prefix(root)
            .map_err(|_| TxnError::OutsideProject {
                path: path.to_path_buf(),
            })?
    } else {
        path
    };

    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(TxnError::OutsideProject {
                    path: path.to_path_buf(),
                });
            }
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(TxnError::OutsideProject {
            path: path.to_path_buf(),
        });
    }
    Ok(clean)
}
