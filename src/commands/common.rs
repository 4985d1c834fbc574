//! Shared setup for every command: config, state paths and the logger.

use crate::config::{config_path, StatePaths, WardenConfig};
use crate::daemon::is_daemon_process;
use crate::heartbeat::HeartbeatMonitor;
use crate::logging::Logger;
use crate::runner::CommandRunner;
use crate::shutdown::Shutdown;
use crate::sync::ConfigSyncEngine;
use anyhow::{Context as _, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Everything a command needs, built once per invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: WardenConfig,
    pub state: StatePaths,
    pub logger: Logger,
}

impl Context {
    /// Resolve and load the config, then open the log.
    ///
    /// The detached daemon's stdout already is the log file, so it does not
    /// mirror to stdout.
    pub fn load(explicit_config: Option<&Path>) -> Result<Self> {
        let path = config_path(explicit_config);
        let config = WardenConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
        let state = StatePaths::from_env().with_log_file(config.log_file_override());
        let logger = Logger::to_file(&state.log_file, &config.logging.level, !is_daemon_process())
            .context("Failed to open log file")?;
        Ok(Self {
            config,
            state,
            logger,
        })
    }

    /// Build a context from parts already in hand.
    pub fn new(config: WardenConfig, state: StatePaths, logger: Logger) -> Self {
        Self {
            config,
            state,
            logger,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config.source_path
    }

    pub fn sync_engine(&self) -> ConfigSyncEngine {
        ConfigSyncEngine::new(&self.config, self.logger.clone())
    }

    /// Shell runner for configured commands, rooted at the config directory.
    pub fn command_runner(&self) -> CommandRunner {
        CommandRunner::new()
            .with_timeout(
                self.config
                    .heartbeat
                    .command_timeout_seconds
                    .map(Duration::from_secs),
            )
            .with_working_dir(self.config.base_dir())
    }

    pub fn heartbeat_monitor(&self, shutdown: Shutdown) -> Result<HeartbeatMonitor> {
        let monitor = HeartbeatMonitor::new(
            &self.config,
            &self.state,
            Arc::new(self.command_runner()),
            self.logger.clone(),
            shutdown,
        )?;
        Ok(monitor)
    }
}

/// Shutdown handle wired to SIGINT/SIGTERM.
pub fn signal_shutdown() -> Result<Shutdown> {
    let shutdown = Shutdown::new();
    shutdown
        .install_signal_handler()
        .context("Failed to install signal handler")?;
    Ok(shutdown)
}
