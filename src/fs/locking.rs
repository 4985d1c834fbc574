//! Advisory file locks (fs2).
//!
//! Locks are cooperative: they only serialize warden processes that take the
//! same lock file, which is all the daemon supervisor needs.

use crate::error::{WardenError, WardenResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Exclusive lock held for as long as the value lives.
#[derive(Debug)]
pub struct ExclusiveLock {
    file: File,
}

impl ExclusiveLock {
    /// Block until the exclusive lock on `path` is ours. Creates the file.
    pub fn acquire(path: &Path) -> WardenResult<Self> {
        let file = open_lock_file(path)?;
        file.lock_exclusive()
            .map_err(|e| WardenError::io(format!("lock {}", path.display()), e))?;
        Ok(Self { file })
    }

    /// Take the lock only if nobody else holds it.
    #[cfg(test)]
    pub(crate) fn try_acquire(path: &Path) -> WardenResult<Option<Self>> {
        let file = open_lock_file(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(WardenError::io(format!("lock {}", path.display()), e)),
        }
    }
}

impl Drop for ExclusiveLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn open_lock_file(path: &Path) -> WardenResult<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| WardenError::io(format!("create {}", parent.display()), e))?;
    }
    #[allow(clippy::suspicious_open_options)]
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)
        .map_err(|e| WardenError::io(format!("open lock file {}", path.display()), e))
}
