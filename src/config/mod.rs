//! Typed watchdog configuration.
//!
//! The config file is a JSON object loaded once per invocation. Every
//! relative path inside it resolves against the directory that contains the
//! file, and `~/` expands to the home directory. After [`WardenConfig::load`]
//! returns, the value is never mutated.

mod paths;

pub use paths::{expand_path, StatePaths, STATE_DIR_ENV};

use crate::error::{WardenError, WardenResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config path.
pub const CONFIG_ENV: &str = "WARDEN_CONFIG";

/// Config file used when neither `--config` nor `WARDEN_CONFIG` is given.
pub const DEFAULT_CONFIG_FILE: &str = "warden.json";

/// Default backoff schedule between health checks, in seconds.
pub const DEFAULT_WAIT_SECONDS: [u64; 3] = [30, 40, 50];

/// Default heartbeat cycle period.
pub const DEFAULT_INTERVAL_MINUTES: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardenConfig {
    pub paths: PathsConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Absolute path of the file this config was loaded from.
    #[serde(skip)]
    pub source_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsConfig {
    #[serde(default = "default_repo_config")]
    pub repo_config: String,
    pub live_config: String,
    #[serde(default = "default_schema_file")]
    pub schema_file: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaSource {
    #[default]
    Local,
    Git,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaConfig {
    #[serde(default)]
    pub source: SchemaSource,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default = "default_schema_ref", rename = "ref")]
    pub git_ref: String,
    #[serde(default = "default_checkout_dir")]
    pub checkout_dir: String,
    #[serde(default)]
    pub local_dependency: bool,
    #[serde(default)]
    pub export_command: Option<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            source: SchemaSource::Local,
            repo_url: None,
            git_ref: default_schema_ref(),
            checkout_dir: default_checkout_dir(),
            local_dependency: false,
            export_command: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub auto_init: bool,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_init: true,
            commit_message: default_commit_message(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default = "default_wait_seconds")]
    pub wait_seconds: Vec<u64>,
    #[serde(default)]
    pub check_command: Option<String>,
    #[serde(default)]
    pub send_command: Option<String>,
    #[serde(default)]
    pub restart_command: Option<String>,
    #[serde(default)]
    pub notify_command: Option<String>,
    #[serde(default = "default_true")]
    pub notify_on_restart: bool,
    #[serde(default)]
    pub agent_probe: AgentProbeConfig,
    /// Kill any heartbeat command still running after this many seconds.
    #[serde(default)]
    pub command_timeout_seconds: Option<u64>,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            wait_seconds: default_wait_seconds(),
            check_command: None,
            send_command: None,
            restart_command: None,
            notify_command: None,
            notify_on_restart: true,
            agent_probe: AgentProbeConfig::default(),
            command_timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProbeConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_fallback_agent")]
    pub fallback_agent_id: String,
    #[serde(default)]
    pub command: Option<String>,
}

impl Default for AgentProbeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            fallback_agent_id: default_fallback_agent(),
            command: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: default_log_level(),
        }
    }
}

fn default_repo_config() -> String {
    "./config/gateway.json".to_string()
}

fn default_schema_file() -> String {
    "./schema/config.schema.json".to_string()
}

fn default_schema_ref() -> String {
    "main".to_string()
}

fn default_checkout_dir() -> String {
    "./schema/source".to_string()
}

fn default_commit_message() -> String {
    "sync: update managed config".to_string()
}

fn default_interval_minutes() -> u64 {
    DEFAULT_INTERVAL_MINUTES
}

fn default_wait_seconds() -> Vec<u64> {
    DEFAULT_WAIT_SECONDS.to_vec()
}

fn default_fallback_agent() -> String {
    "main".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Pick the config path: explicit flag, then `WARDEN_CONFIG`, then `./warden.json`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(CONFIG_ENV) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

impl WardenConfig {
    /// Load and shape-check the config at `path`.
    pub fn load(path: &Path) -> WardenResult<Self> {
        let path = expand_path(path.to_string_lossy().as_ref(), None);
        if !path.is_file() {
            return Err(WardenError::ConfigNotFound(path));
        }
        let source_path = std::path::absolute(&path)
            .map_err(|e| WardenError::io(format!("resolve {}", path.display()), e))?;
        let raw = std::fs::read_to_string(&source_path)
            .map_err(|e| WardenError::io(format!("read {}", source_path.display()), e))?;
        Self::from_json(&raw, source_path)
    }

    /// Parse config text as if it had been read from `source_path`.
    pub fn from_json(raw: &str, source_path: PathBuf) -> WardenResult<Self> {
        let malformed = |reason: String| WardenError::MalformedConfig {
            what: "warden config",
            path: source_path.clone(),
            reason,
        };
        let mut config: WardenConfig =
            serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;
        config.validate_shape().map_err(malformed)?;
        config.source_path = source_path;
        Ok(config)
    }

    fn validate_shape(&self) -> Result<(), String> {
        if self.paths.live_config.trim().is_empty() {
            return Err("paths.liveConfig must not be empty".to_string());
        }
        if self.paths.repo_config.trim().is_empty() {
            return Err("paths.repoConfig must not be empty".to_string());
        }
        if self.heartbeat.interval_minutes == 0 {
            return Err("heartbeat.intervalMinutes must be greater than zero".to_string());
        }
        if self.heartbeat.wait_seconds.is_empty() {
            return Err("heartbeat.waitSeconds must contain at least one entry".to_string());
        }
        if self.schema.source == SchemaSource::Git && self.schema.repo_url.is_none() {
            return Err("schema.repoUrl is required when schema.source is \"git\"".to_string());
        }
        Ok(())
    }

    /// Directory containing the config file; the anchor for relative paths.
    pub fn base_dir(&self) -> PathBuf {
        self.source_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn resolve(&self, raw: &str) -> PathBuf {
        expand_path(raw, Some(&self.base_dir()))
    }

    /// Absolute path of the managed (version-controlled) copy.
    pub fn repo_config_path(&self) -> PathBuf {
        self.resolve(&self.paths.repo_config)
    }

    /// Absolute path of the live config the gateway reads.
    pub fn live_config_path(&self) -> PathBuf {
        self.resolve(&self.paths.live_config)
    }

    pub fn schema_file_path(&self) -> PathBuf {
        self.resolve(&self.paths.schema_file)
    }

    pub fn schema_checkout_dir(&self) -> PathBuf {
        self.resolve(&self.schema.checkout_dir)
    }

    /// Log destination override, if configured.
    pub fn log_file_override(&self) -> Option<PathBuf> {
        self.logging.file.as_deref().map(|raw| self.resolve(raw))
    }
}
