//! Path expansion and the fixed state-directory layout.

use std::path::{Path, PathBuf};

/// Environment variable overriding the state directory.
pub const STATE_DIR_ENV: &str = "WARDEN_STATE_DIR";

/// Expand `~/` to the home directory and anchor relative paths at `base`.
///
/// Without a `base`, relative paths are returned as given.
pub fn expand_path(raw: &str, base: Option<&Path>) -> PathBuf {
    let expanded = if raw == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw))
    } else if let Some(rest) = raw.strip_prefix("~/") {
        match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(raw),
        }
    } else {
        PathBuf::from(raw)
    };

    match base {
        Some(base) if expanded.is_relative() => normalize(&base.join(expanded)),
        _ => expanded,
    }
}

/// Drop `.` components and fold `..` lexically, without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Files the watchdog persists between invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub dir: PathBuf,
    pub pid_file: PathBuf,
    pub lock_file: PathBuf,
    pub log_file: PathBuf,
    pub health_cache: PathBuf,
}

impl StatePaths {
    /// Layout rooted at `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            pid_file: dir.join("warden.pid"),
            lock_file: dir.join("warden.lock"),
            log_file: dir.join("warden.log"),
            health_cache: dir.join("health-cache.json"),
            dir,
        }
    }

    /// `$WARDEN_STATE_DIR`, else `<tmp>/warden`.
    pub fn from_env() -> Self {
        match std::env::var_os(STATE_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Self::in_dir(dir),
            _ => Self::in_dir(std::env::temp_dir().join("warden")),
        }
    }

    /// Same layout but with the log file redirected.
    pub fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        if let Some(path) = log_file {
            self.log_file = path;
        }
        self
    }

    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }
}
