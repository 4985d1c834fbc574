//! The persisted "a background watchdog is running" record.

use crate::error::{WardenError, WardenResult};
use crate::fs::atomic_write;
use crate::process::{is_process_alive, process_start_token};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pid of the background watchdog plus the start token of that exact
/// process, so a recycled pid is not mistaken for the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonRecord {
    pub pid: u32,
    #[serde(default)]
    pub start_token: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl DaemonRecord {
    /// Record for a process that was just spawned.
    pub fn capture(pid: u32) -> Self {
        Self {
            pid,
            start_token: process_start_token(pid),
            started_at: Some(Utc::now()),
        }
    }

    /// Read the record; `Ok(None)` when there is none.
    ///
    /// A file holding only a bare pid is accepted (no start token).
    pub fn read(path: &Path) -> WardenResult<Option<Self>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(WardenError::io(format!("read {}", path.display()), e)),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if let Ok(pid) = trimmed.parse::<u32>() {
            return Ok(Some(Self {
                pid,
                start_token: None,
                started_at: None,
            }));
        }
        serde_json::from_str(trimmed)
            .map(Some)
            .map_err(|e| WardenError::MalformedConfig {
                what: "daemon record",
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    pub fn write(&self, path: &Path) -> WardenResult<()> {
        let json = serde_json::to_vec(self).map_err(|e| WardenError::MalformedConfig {
            what: "daemon record",
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        atomic_write(path, &json)
    }

    pub fn remove(path: &Path) -> WardenResult<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WardenError::io(format!("remove {}", path.display()), e)),
        }
    }

    /// The recorded process still exists and is the same incarnation.
    ///
    /// When either token is unknown only the signal probe is used.
    pub fn is_alive(&self) -> bool {
        if !is_process_alive(self.pid) {
            return false;
        }
        match (&self.start_token, process_start_token(self.pid)) {
            (Some(recorded), Some(current)) => *recorded == current,
            _ => true,
        }
    }
}
