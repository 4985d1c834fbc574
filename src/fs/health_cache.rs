//! Last-known gateway identifiers, written by the external health check.
//!
//! The check command owns the file; warden only reads it to fill command
//! templates. A missing file means "no data yet". The writer is not
//! coordinated with readers: last writer wins.

use crate::error::{WardenError, WardenResult};
use crate::fs::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCache {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub session_key: Option<String>,
    #[serde(default)]
    pub sessions_path: Option<String>,
    /// Informational only. Accepts RFC 3339 or epoch milliseconds; anything
    /// else reads as `None` rather than rejecting the whole cache.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    })
}

impl HealthCache {
    /// Read the cache. `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> WardenResult<Option<Self>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(WardenError::io(format!("read {}", path.display()), e)),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| WardenError::MalformedConfig {
                what: "health cache",
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Overwrite the cache atomically, stamping `updatedAt`.
    pub fn store(&self, path: &Path) -> WardenResult<()> {
        let mut stamped = self.clone();
        stamped.updated_at = Some(Utc::now());
        let json = serde_json::to_vec_pretty(&stamped).map_err(|e| WardenError::MalformedConfig {
            what: "health cache",
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        atomic_write(path, &json)
    }
}
