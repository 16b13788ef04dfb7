use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use shipwright_core::{FileAction, FileChange, TraceId};
use tracing::{debug, error, warn};

use crate::error::{Result, TxnError};
use crate::manifest::{Original, TraceManifest};
use crate::paths::relative_to;

/// A rollback step that could not be completed.
#[derive(Debug)]
pub struct RollbackFailure {
    pub path: PathBuf,
    pub error: TxnError,
}

/// Tally of a rollback pass. Failures are collected, never raised.
#[derive(Debug, Default)]
pub struct RollbackOutcome {
    pub removed: usize,
    pub restored: usize,
    pub unchanged: usize,
    pub failures: Vec<RollbackFailure>,
}

impl RollbackOutcome {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Reverted {
    Removed,
    Restored,
    Unchanged,
}

/// Backs up, writes and reverts files under a project root.
///
/// Backups land in `<backup_dir>/<trace_id>/<relative path>` and each trace
/// keeps a journal at `<backup_dir>/<trace_id>.journal.json`. A path is
/// backed up only the first time a trace touches it, so rollback always
/// restores the content from before the run.
///
/// One manager may serve many concurrent traces; traces never share backup
/// locations.
#[derive(Debug)]
pub struct FileTransactionManager {
    project_root: PathBuf,
    backup_dir: PathBuf,
    manifests: Mutex<HashMap<TraceId, TraceManifest>>,
}

impl FileTransactionManager {
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            backup_dir: backup_dir.into(),
            manifests: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Backup root as configured, relative to the project root.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    #[must_use]
    pub fn trace_backup_dir(&self, trace_id: TraceId) -> PathBuf {
        self.project_root
            .join(&self.backup_dir)
            .join(trace_id.to_string())
    }

    #[must_use]
    pub fn journal_path(&self, trace_id: TraceId) -> PathBuf {
        self.project_root
            .join(&self.backup_dir)
            .join(format!("{trace_id}.journal.json"))
    }

    /// Copies `path` into the trace's backup area.
    ///
    /// Returns the backup location relative to the project root, or `None`
    /// when the path did not exist. A second call for the same path and trace
    /// returns the first backup without copying again.
    ///
    /// # Errors
    ///
    /// Returns [`TxnError::OutsideProject`] for paths that escape the project
    /// root and [`TxnError::Backup`] when the copy fails.
    pub fn backup(&self, path: &Path, trace_id: TraceId) -> Result<Option<PathBuf>> {
        let rel = relative_to(&self.project_root, path)?;
        let target = self.project_root.join(&rel);

        let mut manifests = self.lock();
        let manifest = self.manifest_mut(&mut manifests, trace_id)?;
        let original = self.record_original(manifest, &rel, &target, trace_id)?;
        manifest.save(&self.journal_path(trace_id))?;

        Ok(original.backup().map(Path::to_path_buf))
    }

    /// Writes `content` to `path`, recording the change.
    ///
    /// The change is journaled before the target is touched. If the write
    /// fails, the target is returned to its pre-write state and the journal
    /// entry is withdrawn.
    ///
    /// # Errors
    ///
    /// Returns [`TxnError::OutsideProject`] for paths that escape the project
    /// root, [`TxnError::Backup`] if the original cannot be saved,
    /// [`TxnError::JournalWrite`] if the journal cannot be persisted, and
    /// [`TxnError::Write`] if the target cannot be written.
    pub fn write(&self, path: &Path, content: &str, trace_id: TraceId) -> Result<FileChange> {
        let rel = relative_to(&self.project_root, path)?;
        let target = self.project_root.join(&rel);
        let journal_path = self.journal_path(trace_id);

        let mut manifests = self.lock();
        let manifest = self.manifest_mut(&mut manifests, trace_id)?;
        let original = self.record_original(manifest, &rel, &target, trace_id)?;

        let lines_added = content.split('\n').count();
        let change = match original.backup() {
            Some(backup) => FileChange::modified(&rel, lines_added, backup),
            None => FileChange::created(&rel, lines_added),
        };

        let prior = read_prior(&target)?;
        manifest.journal.push(change.clone());
        if let Err(e) = manifest.save(&journal_path) {
            manifest.journal.pop();
            return Err(e);
        }

        if let Err(e) = write_file(&target, content) {
            undo_partial_write(&target, prior.as_deref());
            manifest.journal.pop();
            if let Err(save_err) = manifest.save(&journal_path) {
                warn!(journal = %journal_path.display(), error = %save_err, "failed to withdraw journal entry");
            }
            return Err(e);
        }

        debug!(
            trace_id = %trace_id,
            path = %rel.display(),
            action = %change.action(),
            lines = lines_added,
            "wrote file"
        );
        Ok(change)
    }

    /// Deletes `path`, keeping a backup so rollback can bring it back.
    ///
    /// # Errors
    ///
    /// Returns [`TxnError::NotFound`] if there is nothing to delete,
    /// [`TxnError::Backup`] if the original cannot be saved and
    /// [`TxnError::Remove`] if the deletion fails.
    pub fn remove(&self, path: &Path, trace_id: TraceId) -> Result<FileChange> {
        let rel = relative_to(&self.project_root, path)?;
        let target = self.project_root.join(&rel);
        if !target.is_file() {
            return Err(TxnError::NotFound { path: rel });
        }
        let journal_path = self.journal_path(trace_id);

        let mut manifests = self.lock();
        let manifest = self.manifest_mut(&mut manifests, trace_id)?;
        let original = self.record_original(manifest, &rel, &target, trace_id)?;

        let change = FileChange::deleted(&rel, original.backup().map(Path::to_path_buf));
        manifest.journal.push(change.clone());
        if let Err(e) = manifest.save(&journal_path) {
            manifest.journal.pop();
            return Err(e);
        }

        if let Err(source) = fs::remove_file(&target) {
            manifest.journal.pop();
            if let Err(save_err) = manifest.save(&journal_path) {
                warn!(journal = %journal_path.display(), error = %save_err, "failed to withdraw journal entry");
            }
            return Err(TxnError::Remove { path: rel, source });
        }

        debug!(trace_id = %trace_id, path = %rel.display(), "removed file");
        Ok(change)
    }

    /// Reverses `changes` from last to first.
    ///
    /// Created files are deleted, modified and deleted files are restored
    /// from their backups. A step that fails is logged and collected; the
    /// remaining steps still run. Running the same list again finds nothing
    /// left to do.
    pub fn rollback(&self, changes: &[FileChange]) -> RollbackOutcome {
        let mut outcome = RollbackOutcome::default();

        for change in changes.iter().rev() {
            match self.revert(change) {
                Ok(Reverted::Removed) => outcome.removed += 1,
                Ok(Reverted::Restored) => outcome.restored += 1,
                Ok(Reverted::Unchanged) => outcome.unchanged += 1,
                Err(e) => {
                    error!(path = %change.path().display(), error = %e, "rollback step failed");
                    outcome.failures.push(RollbackFailure {
                        path: change.path().to_path_buf(),
                        error: e,
                    });
                }
            }
        }

        debug!(
            removed = outcome.removed,
            restored = outcome.restored,
            unchanged = outcome.unchanged,
            failed = outcome.failures.len(),
            "rollback finished"
        );
        outcome
    }

    /// Reads the persisted change journal of a trace.
    ///
    /// This is the recovery entry point for runs abandoned mid-flight: the
    /// journal holds every change that may have reached the disk.
    ///
    /// # Errors
    ///
    /// Returns [`TxnError::JournalRead`] or [`TxnError::JournalFormat`] if the
    /// journal exists but cannot be read.
    pub fn journal(&self, trace_id: TraceId) -> Result<Vec<FileChange>> {
        Ok(TraceManifest::load(&self.journal_path(trace_id))?
            .map(|manifest| manifest.journal)
            .unwrap_or_default())
    }

    /// Rolls back everything journaled for `trace_id`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the journal cannot be read.
    pub fn rollback_trace(&self, trace_id: TraceId) -> Result<RollbackOutcome> {
        let journal = self.journal(trace_id)?;
        Ok(self.rollback(&journal))
    }

    /// Forgets the in-memory bookkeeping of a finished trace.
    ///
    /// The journal on disk is kept, so [`rollback_trace`](Self::rollback_trace)
    /// still works and a later write for the same trace reloads it. Returns
    /// whether the trace was held.
    pub fn release(&self, trace_id: TraceId) -> bool {
        self.lock().remove(&trace_id).is_some()
    }

    /// Number of traces whose bookkeeping is held in memory.
    #[must_use]
    pub fn active_traces(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TraceId, TraceManifest>> {
        self.manifests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn manifest_mut<'a>(
        &self,
        manifests: &'a mut HashMap<TraceId, TraceManifest>,
        trace_id: TraceId,
    ) -> Result<&'a mut TraceManifest> {
        match manifests.entry(trace_id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let loaded = TraceManifest::load(&self.journal_path(trace_id))?.unwrap_or_default();
                Ok(entry.insert(loaded))
            }
        }
    }

    fn record_original(
        &self,
        manifest: &mut TraceManifest,
        rel: &Path,
        target: &Path,
        trace_id: TraceId,
    ) -> Result<Original> {
        if let Some(original) = manifest.originals.get(rel) {
            return Ok(original.clone());
        }

        let original = if target.exists() {
            let backup_rel = self.backup_dir.join(trace_id.to_string()).join(rel);
            let backup_abs = self.project_root.join(&backup_rel);
            let backup_err = |source| TxnError::Backup {
                path: rel.to_path_buf(),
                source,
            };
            if let Some(parent) = backup_abs.parent() {
                fs::create_dir_all(parent).map_err(backup_err)?;
            }
            fs::copy(target, &backup_abs).map_err(backup_err)?;
            debug!(trace_id = %trace_id, path = %rel.display(), backup = %backup_rel.display(), "backed up file");
            Original::Present { backup: backup_rel }
        } else {
            Original::Absent
        };

        manifest
            .originals
            .insert(rel.to_path_buf(), original.clone());
        Ok(original)
    }

    fn revert(&self, change: &FileChange) -> Result<Reverted> {
        let rel = relative_to(&self.project_root, change.path())?;
        let target = self.project_root.join(&rel);

        match (change.action(), change.backup_path()) {
            (FileAction::Created, _) => {
                if !target.exists() {
                    return Ok(Reverted::Unchanged);
                }
                fs::remove_file(&target).map_err(|source| TxnError::Remove {
                    path: rel.clone(),
                    source,
                })?;
                debug!(path = %rel.display(), "removed created file");
                Ok(Reverted::Removed)
            }
            (FileAction::Modified | FileAction::Deleted, Some(backup)) => {
                let backup_abs = self.project_root.join(backup);
                if !backup_abs.is_file() {
                    return Err(TxnError::MissingBackup {
                        path: rel,
                        backup: backup.to_path_buf(),
                    });
                }
                if same_content(&target, &backup_abs) {
                    return Ok(Reverted::Unchanged);
                }
                let restore_err = |source| TxnError::Restore {
                    path: rel.clone(),
                    backup: backup.to_path_buf(),
                    source,
                };
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(restore_err)?;
                }
                fs::copy(&backup_abs, &target).map_err(restore_err)?;
                debug!(path = %rel.display(), backup = %backup.display(), "restored file");
                Ok(Reverted::Restored)
            }
            (FileAction::Deleted, None) => Ok(Reverted::Unchanged),
            (FileAction::Modified, None) => Err(TxnError::MissingBackup {
                path: rel,
                backup: PathBuf::new(),
            }),
        }
    }
}

fn read_prior(target: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(target) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(TxnError::Write {
            path: target.to_path_buf(),
            source,
        }),
    }
}

fn write_file(target: &Path, content: &str) -> Result<()> {
    let write_err = |source| TxnError::Write {
        path: target.to_path_buf(),
        source,
    };
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(target, content).map_err(write_err)
}

fn undo_partial_write(target: &Path, prior: Option<&[u8]>) {
    let result = match prior {
        Some(bytes) => fs::write(target, bytes),
        None if target.exists() => fs::remove_file(target),
        None => Ok(()),
    };
    if let Err(e) = result {
        error!(path = %target.display(), error = %e, "failed to undo partial write");
    }
}

fn same_content(a: &Path, b: &Path) -> bool {
    match (fs::read(a), fs::read(b)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}
