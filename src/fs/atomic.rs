//! Atomic file replacement.
//!
//! New content goes to a temporary file in the destination's own directory
//! (same filesystem, so the final rename is atomic), is flushed to disk, and
//! only then renamed over the destination. A reader sees either the previous
//! file in full or the new one in full.

use crate::error::{WardenError, WardenResult};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Content written to a sibling temp file but not yet renamed into place.
///
/// Dropping a `StagedWrite` without calling [`StagedWrite::commit`] removes
/// the temp file and leaves the destination untouched.
pub struct StagedWrite {
    temp: NamedTempFile,
    dest: PathBuf,
}

impl StagedWrite {
    pub fn new(dest: &Path, contents: &[u8]) -> WardenResult<Self> {
        let dir = match dest.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .map_err(|e| WardenError::io(format!("create {}", dir.display()), e))?;

        let mut temp = tempfile::Builder::new()
            .prefix(".warden-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| WardenError::io(format!("create temp file in {}", dir.display()), e))?;
        temp.write_all(contents)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| WardenError::io(format!("write temp file for {}", dest.display()), e))?;

        // Keep the destination's mode; tempfile creates 0600 files.
        if let Ok(meta) = std::fs::metadata(dest) {
            std::fs::set_permissions(temp.path(), meta.permissions()).map_err(|e| {
                WardenError::io(format!("copy permissions of {}", dest.display()), e)
            })?;
        }

        Ok(Self {
            temp,
            dest: dest.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub(crate) fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Rename the temp file over the destination.
    pub fn commit(self) -> WardenResult<()> {
        let dest = self.dest;
        self.temp
            .persist(&dest)
            .map_err(|e| WardenError::io(format!("replace {}", dest.display()), e.error))?;
        Ok(())
    }
}

/// Replace `dest` with `contents` atomically.
pub fn atomic_write(dest: &Path, contents: &[u8]) -> WardenResult<()> {
    StagedWrite::new(dest, contents)?.commit()
}

/// Hex SHA-256 of `contents`.
pub fn content_digest(contents: &[u8]) -> String {
    hex::encode(Sha256::digest(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("nested").join("live.json");

        atomic_write(&dest, b"{\"a\":1}").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn test_atomic_write_replaces_and_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("live.json");
        fs::write(&dest, "old").unwrap();

        atomic_write(&dest, b"new").unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_interrupted_write_keeps_previous_content() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("live.json");
        fs::write(&dest, "previous version").unwrap();

        let staged = StagedWrite::new(&dest, b"half-finished replacement").unwrap();
        let temp_path = staged.temp_path().to_path_buf();
        assert_eq!(temp_path.parent(), dest.parent());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "previous version");

        // Process "dies" before the rename.
        drop(staged);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "previous version");
        assert!(!temp_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_are_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("live.json");
        fs::write(&dest, "old").unwrap();
        fs::set_permissions(&dest, fs::Permissions::from_mode(0o644)).unwrap();

        atomic_write(&dest, b"new").unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn test_digest_is_stable_hex() {
        let digest = content_digest(b"abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
