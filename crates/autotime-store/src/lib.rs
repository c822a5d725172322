//! Storage layer for the autotime daily log.
//!
//! The whole [`DailyLog`] is written as a single JSON snapshot on every
//! change. There is no incremental format: each save replaces the previous
//! file.
//!
//! # Snapshot Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "days": {
//!     "2024-01-01": { "arrive": "2024-01-01T08:00:00", "leave": "2024-01-01T16:30:00" }
//!   }
//! }
//! ```
//!
//! Timestamps are local wall-clock times without an offset, which is also how
//! the interpreter sees them. Missing endpoints are omitted.
//!
//! # Durability
//!
//! Saves go to a sibling temporary file that is synced and then renamed over
//! the snapshot, so a crash mid-write leaves either the old or the new
//! snapshot in place, never a truncated one.
//!
//! # Exclusive Access
//!
//! [`LogStore::lock`] takes an advisory lock on `<snapshot>.lock`. Trackers
//! hold it for their whole lifetime so two processes never interleave saves.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use autotime_core::DailyLog;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the snapshot failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The snapshot file exists but holds no data.
    #[error("snapshot {} is empty", path.display())]
    Empty { path: PathBuf },
    /// The snapshot could not be decoded.
    #[error("snapshot {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The snapshot was written by an incompatible version.
    #[error("snapshot {} has unsupported version {version}", path.display())]
    UnsupportedVersion { path: PathBuf, version: u32 },
    /// Encoding the log failed.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    /// Another tracker holds the store lock.
    #[error("{} is locked by another autotime process", path.display())]
    Locked { path: PathBuf },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the error means the snapshot content is unusable, as opposed
    /// to the file being unreachable.
    pub const fn is_unreadable_snapshot(&self) -> bool {
        matches!(
            self,
            Self::Empty { .. } | Self::Corrupt { .. } | Self::UnsupportedVersion { .. }
        )
    }
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    version: u32,
    days: DailyLog,
}

#[derive(Debug, Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    days: &'a DailyLog,
}

/// File-backed home of the daily log.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
}

/// Exclusive hold on a [`LogStore`], released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::debug!(path = %self.path.display(), error = %err, "failed to release store lock");
        }
    }
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the advisory lock file guarding this store.
    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, ".lock")
    }

    /// Loads the snapshot.
    ///
    /// A missing file is an empty log. Empty, corrupt or foreign-version
    /// files are reported as errors so the caller can decide what to do.
    pub fn load(&self) -> Result<DailyLog, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no snapshot yet");
                return Ok(DailyLog::new());
            }
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };

        if contents.trim().is_empty() {
            return Err(StoreError::Empty {
                path: self.path.clone(),
            });
        }

        let snapshot: Snapshot =
            serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: self.path.clone(),
                version: snapshot.version,
            });
        }

        tracing::debug!(path = %self.path.display(), days = snapshot.days.len(), "loaded snapshot");
        Ok(snapshot.days)
    }

    /// Loads the snapshot, starting from an empty log when it is unusable.
    ///
    /// An unusable file is moved aside to `<snapshot>.corrupt` first so the
    /// next save does not destroy it. I/O failures are still returned.
    pub fn load_or_empty(&self) -> Result<DailyLog, StoreError> {
        match self.load() {
            Ok(log) => Ok(log),
            Err(err) if err.is_unreadable_snapshot() => {
                tracing::warn!(error = %err, "no log could be loaded, initializing to empty");
                self.quarantine()?;
                Ok(DailyLog::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Writes the whole log, replacing any previous snapshot.
    pub fn save(&self, log: &DailyLog) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
        }

        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            days: log,
        };
        let json = serde_json::to_vec_pretty(&snapshot).map_err(StoreError::Encode)?;

        let tmp_path = sibling(&self.path, ".tmp");
        let mut file = File::create(&tmp_path).map_err(|err| StoreError::io(&tmp_path, err))?;
        file.write_all(&json)
            .and_then(|()| file.sync_all())
            .map_err(|err| StoreError::io(&tmp_path, err))?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|err| StoreError::io(&self.path, err))?;
        tracing::debug!(path = %self.path.display(), days = log.len(), "saved snapshot");
        Ok(())
    }

    /// Takes the exclusive store lock without blocking.
    pub fn lock(&self) -> Result<StoreLock, StoreError> {
        let path = self.lock_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
        }

        let file = File::create(&path).map_err(|err| StoreError::io(&path, err))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(StoreLock { file, path }),
            Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                Err(StoreError::Locked { path })
            }
            Err(err) => Err(StoreError::io(&path, err)),
        }
    }

    fn quarantine(&self) -> Result<(), StoreError> {
        let target = quarantine_target(&self.path);
        fs::rename(&self.path, &target).map_err(|err| StoreError::io(&self.path, err))?;
        tracing::warn!(path = %target.display(), "moved unreadable snapshot aside");
        Ok(())
    }
}

/// First free name of `<path>.corrupt`, `<path>.corrupt.1`, ...
fn quarantine_target(path: &Path) -> PathBuf {
    let mut target = sibling(path, ".corrupt");
    let mut attempt = 1_u32;
    while target.exists() {
        target = sibling(path, &format!(".corrupt.{attempt}"));
        attempt += 1;
    }
    target
}

/// `<path><suffix>`, keeping the original extension.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("autotime"), ToOwned::to_owned);
    name.push(suffix);
    path.with_file_name(name)
}
