//! Shared sandbox for integration tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use warden::commands::Context;
use warden::config::{StatePaths, WardenConfig};
use warden::logging::Logger;

/// Gateway config schema: `gateway.port` must be an integer.
pub const SCHEMA: &str = r#"{
  "type": "object",
  "required": ["gateway"],
  "properties": {
    "gateway": {
      "type": "object",
      "required": ["port"],
      "properties": {
        "port": { "type": "integer", "minimum": 1 },
        "bind": { "type": "string" }
      }
    }
  }
}"#;

pub const LIVE: &str = "{\n  \"gateway\": {\n    \"port\": 18789,\n    \"bind\": \"loopback\"\n  }\n}\n";

/// A temp directory laid out like a deployment:
///
/// ```text
/// warden.json
/// live/gateway.json          the config the gateway reads
/// config/gateway.json        the managed copy (git repo lives here)
/// schema/config.schema.json
/// state/                     pid, lock, log, health cache
/// ```
pub struct Sandbox {
    pub temp: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::with_heartbeat("{}")
    }

    /// Sandbox whose config carries `heartbeat` as its heartbeat section.
    pub fn with_heartbeat(heartbeat: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path();

        fs::create_dir_all(root.join("live")).expect("Failed to create live dir");
        fs::create_dir_all(root.join("schema")).expect("Failed to create schema dir");
        fs::write(root.join("live/gateway.json"), LIVE).expect("Failed to write live config");
        fs::write(root.join("schema/config.schema.json"), SCHEMA)
            .expect("Failed to write schema");

        let config = format!(
            r#"{{
  "paths": {{
    "repoConfig": "./config/gateway.json",
    "liveConfig": "./live/gateway.json",
    "schemaFile": "./schema/config.schema.json"
  }},
  "git": {{ "commitMessage": "test: sync" }},
  "heartbeat": {heartbeat}
}}"#
        );
        fs::write(root.join("warden.json"), config).expect("Failed to write warden.json");

        Self { temp }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn config_file(&self) -> PathBuf {
        self.root().join("warden.json")
    }

    pub fn live(&self) -> PathBuf {
        self.root().join("live/gateway.json")
    }

    pub fn managed(&self) -> PathBuf {
        self.root().join("config/gateway.json")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root().join("state")
    }

    pub fn config(&self) -> WardenConfig {
        WardenConfig::load(&self.config_file()).expect("Failed to load sandbox config")
    }

    /// Context that logs to the sandbox state dir without touching stdout.
    pub fn context(&self) -> Context {
        let state = StatePaths::in_dir(self.state_dir());
        let logger =
            Logger::to_file(&state.log_file, "debug", false).expect("Failed to open log file");
        Context::new(self.config(), state, logger)
    }

    /// Commits recorded for the managed copy; zero before the first one.
    pub fn commit_count(&self) -> usize {
        let repo = self.root().join("config");
        if !repo.is_dir() {
            return 0;
        }
        let output = Command::new("git")
            .args(["rev-list", "--count", "HEAD", "--", "gateway.json"])
            .current_dir(&repo)
            .output()
            .expect("Failed to run git");
        if !output.status.success() {
            return 0;
        }
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .expect("git printed a count")
    }

    pub fn read(&self, path: &Path) -> Vec<u8> {
        fs::read(path).unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
    }

    /// Lines in a sandbox-relative counter file; zero when absent.
    pub fn lines_in(&self, name: &str) -> usize {
        fs::read_to_string(self.root().join(name))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }
}
