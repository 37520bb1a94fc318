//! Timestamped backups of original files and verbatim restore.
//!
//! Layout: `<root>/<backup_dir>/<run id>/<path relative to root>`. A snapshot
//! directory is created lazily, the first time a file is recorded, and is never
//! deleted by this crate.
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::params::DEFAULT_BACKUP_DIR;
use crate::error::{Error, Result};

/// Run id for a snapshot taken now: `YYYYMMDD_HHMMSS`, local time.
pub fn run_id_now() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Only plain relative paths may be mirrored into or out of a snapshot.
fn ensure_relative(path: &Path) -> Result<()> {
    let plain = !path.as_os_str().is_empty()
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(())
    } else {
        Err(Error::UnsafePath {
            path: path.to_path_buf(),
        })
    }
}

/// Backups of one run under one root.
#[derive(Debug)]
pub struct SnapshotHandle {
    run_id: String,
    dir: PathBuf,
    recorded: HashSet<PathBuf>,
}

impl SnapshotHandle {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True once at least one file has been written into the snapshot.
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Files covered by this snapshot so far in this run.
    pub fn recorded_count(&self) -> usize {
        self.recorded.len()
    }

    /// Store the pre-mutation bytes of `relative_path`.
    ///
    /// Returns `false` without writing when the path was already recorded in this
    /// run or a backup for it already exists: the first copy is the original and
    /// is never overwritten.
    pub fn record(&mut self, relative_path: &Path, original_bytes: &[u8]) -> Result<bool> {
        ensure_relative(relative_path)?;
        if self.recorded.contains(relative_path) {
            debug!("Backup already recorded: {}", relative_path.display());
            return Ok(false);
        }

        let target = self.dir.join(relative_path);
        if target.exists() {
            debug!("Backup already on disk: {}", target.display());
            self.recorded.insert(relative_path.to_path_buf());
            return Ok(false);
        }

        if !self.dir.exists() {
            info!("Creating backup snapshot {}", self.dir.display());
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, original_bytes)?;
        self.recorded.insert(relative_path.to_path_buf());
        debug!(
            "Backed up {} ({} bytes)",
            relative_path.display(),
            original_bytes.len()
        );
        Ok(true)
    }
}

/// Files written back by [`BackupManager::restore`].
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    pub run_id: String,
    pub restored: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct BackupManager {
    backup_dir: String,
}

impl Default for BackupManager {
    fn default() -> Self {
        Self::new(DEFAULT_BACKUP_DIR)
    }
}

impl BackupManager {
    pub fn new(backup_dir: impl Into<String>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backups_root(&self, root: &Path) -> PathBuf {
        root.join(&self.backup_dir)
    }

    pub fn snapshot_dir(&self, root: &Path, run_id: &str) -> Result<PathBuf> {
        ensure_relative(Path::new(run_id))?;
        if Path::new(run_id).components().count() != 1 {
            return Err(Error::UnsafePath {
                path: PathBuf::from(run_id),
            });
        }
        Ok(self.backups_root(root).join(run_id))
    }

    /// Handle for run `run_id` under `root`. Nothing touches the disk until the
    /// first [`SnapshotHandle::record`].
    pub fn snapshot(&self, root: &Path, run_id: &str) -> Result<SnapshotHandle> {
        let dir = self.snapshot_dir(root, run_id)?;
        Ok(SnapshotHandle {
            run_id: run_id.to_string(),
            dir,
            recorded: HashSet::new(),
        })
    }

    /// Copy every file of snapshot `run_id` back over its original location.
    ///
    /// Fails with [`Error::MissingSnapshot`] before touching anything when the
    /// snapshot does not exist.
    pub fn restore(&self, root: &Path, run_id: &str) -> Result<RestoreReport> {
        let dir = self.snapshot_dir(root, run_id)?;
        if !dir.is_dir() {
            warn!("Backup not found: {}", dir.display());
            return Err(Error::MissingSnapshot {
                run_id: run_id.to_string(),
                path: dir,
            });
        }

        info!("Restoring from: {}", dir.display());
        let mut report = RestoreReport {
            run_id: run_id.to_string(),
            restored: Vec::new(),
        };

        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Processing(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&dir)
                .map_err(|e| Error::Processing(e.to_string()))?
                .to_path_buf();
            let target = root.join(&relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            info!("  Restored: {}", relative.display());
            report.restored.push(relative);
        }

        info!("Restore complete: {} file(s)", report.restored.len());
        Ok(report)
    }

    /// Snapshot ids under `root`, newest first.
    pub fn list_snapshots(&self, root: &Path) -> Result<Vec<String>> {
        let backups = self.backups_root(root);
        if !backups.is_dir() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in WalkDir::new(&backups).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| Error::Processing(e.to_string()))?;
            if entry.file_type().is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort_unstable_by(|a, b| b.cmp(a));
        Ok(ids)
    }
}
