//! Gateway heartbeat: check, back off, restart, notify.
//!
//! One cycle walks the configured wait schedule:
//!
//! ```text
//! IDLE -> (SEND) -> WAIT -> CHECK -+-> healthy ----------------------------> IDLE
//!                    ^             |
//!                    +-- (SEND) <--+-- unhealthy, entries left
//!                                  +-- schedule exhausted -> RESTART -> NOTIFY -> IDLE
//! ```
//!
//! Only check/probe results move the state machine. Send, restart and notify
//! failures are logged as warnings and never end a cycle early.

mod scheduler;

pub use scheduler::CycleGuard;

use crate::config::{HeartbeatConfig, StatePaths, WardenConfig};
use crate::error::{WardenError, WardenResult};
use crate::fs::HealthCache;
use crate::logging::Logger;
use crate::runner::template::{
    VAR_AGENT_ID, VAR_CYCLE_ID, VAR_HEALTH_CACHE, VAR_LIVE_CONFIG, VAR_REPO_CONFIG,
    VAR_SESSIONS_PATH, VAR_SESSION_ID, VAR_SESSION_KEY,
};
use crate::runner::{Execute, TemplateVars};
use crate::shutdown::Shutdown;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// The commands a cycle can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Send,
    Check,
    Probe,
    Restart,
    Notify,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Send => "send",
            Step::Check => "check",
            Step::Probe => "probe",
            Step::Restart => "restart",
            Step::Notify => "notify",
        };
        f.write_str(name)
    }
}

/// Cycle-scoped state. Never persisted.
#[derive(Debug, Clone)]
pub struct HeartbeatAttempt {
    pub cycle_id: String,
    /// Position in the wait schedule.
    pub wait_index: usize,
    /// Whether a send step ran before the first check.
    pub sent_before_first: bool,
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    Healthy {
        attempts: usize,
    },
    Restarted {
        attempts: usize,
        restart_ok: bool,
        notified: bool,
    },
    /// Shutdown arrived during a wait; nothing was restarted.
    Aborted {
        attempts: usize,
    },
}

impl CycleReport {
    pub fn attempts(&self) -> usize {
        match self {
            CycleReport::Healthy { attempts }
            | CycleReport::Restarted { attempts, .. }
            | CycleReport::Aborted { attempts } => *attempts,
        }
    }
}

pub struct HeartbeatMonitor {
    settings: HeartbeatConfig,
    check_command: String,
    interval: Duration,
    waits: Vec<Duration>,
    repo_config: PathBuf,
    live_config: PathBuf,
    health_cache: PathBuf,
    executor: Arc<dyn Execute>,
    logger: Logger,
    shutdown: Shutdown,
    in_progress: Arc<AtomicBool>,
}

impl HeartbeatMonitor {
    /// Build a monitor. Fails when no check command is configured.
    pub fn new(
        config: &WardenConfig,
        state: &StatePaths,
        executor: Arc<dyn Execute>,
        logger: Logger,
        shutdown: Shutdown,
    ) -> WardenResult<Self> {
        let settings = config.heartbeat.clone();
        let check_command = settings
            .check_command
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| WardenError::MalformedConfig {
                what: "warden config",
                path: config.source_path.clone(),
                reason: "heartbeat.checkCommand is required for heartbeat mode".to_string(),
            })?;
        let waits = settings
            .wait_seconds
            .iter()
            .map(|s| Duration::from_secs(*s))
            .collect();

        Ok(Self {
            interval: Duration::from_secs(settings.interval_minutes.saturating_mul(60)),
            check_command,
            waits,
            settings,
            repo_config: config.repo_config_path(),
            live_config: config.live_config_path(),
            health_cache: state.health_cache.clone(),
            executor,
            logger,
            shutdown,
            in_progress: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Override the tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override the wait schedule.
    pub fn with_waits(mut self, waits: Vec<Duration>) -> Self {
        self.waits = waits;
        self
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Run one full cycle on the calling thread.
    pub fn run_cycle(&self) -> WardenResult<CycleReport> {
        let mut attempt = HeartbeatAttempt {
            cycle_id: Uuid::new_v4().to_string(),
            wait_index: 0,
            sent_before_first: false,
        };
        self.logger.debug(format!("cycle {} started", attempt.cycle_id));

        if self.settings.send_command.is_some() {
            self.send(&attempt);
            attempt.sent_before_first = true;
        }

        let mut attempts = 0;
        for (index, wait) in self.waits.iter().enumerate() {
            attempt.wait_index = index;
            if self.shutdown.wait(*wait) {
                self.logger.info(format!(
                    "cycle {} aborted by shutdown after {attempts} check(s)",
                    attempt.cycle_id
                ));
                return Ok(CycleReport::Aborted { attempts });
            }

            attempts += 1;
            if self.is_healthy(&attempt) {
                self.logger.info(format!(
                    "cycle {}: gateway healthy (attempt {attempts}/{})",
                    attempt.cycle_id,
                    self.waits.len()
                ));
                return Ok(CycleReport::Healthy { attempts });
            }

            self.logger.warn(format!(
                "cycle {}: gateway unhealthy (attempt {attempts}/{})",
                attempt.cycle_id,
                self.waits.len()
            ));
            if index + 1 < self.waits.len() && self.settings.send_command.is_some() {
                self.send(&attempt);
            }
        }

        let restart_ok = self.restart(&attempt);
        let notified = self.notify(&attempt);
        Ok(CycleReport::Restarted {
            attempts,
            restart_ok,
            notified,
        })
    }

    fn is_healthy(&self, attempt: &HeartbeatAttempt) -> bool {
        if !self.run_step(Step::Check, &self.check_command, attempt) {
            return false;
        }
        let probe = &self.settings.agent_probe;
        if !probe.enabled {
            return true;
        }
        match probe.command.as_deref() {
            Some(command) if !command.trim().is_empty() => {
                self.run_step(Step::Probe, command, attempt)
            }
            _ => {
                self.logger.warn(
                    "agentProbe is enabled but has no command; treating check success as healthy",
                );
                true
            }
        }
    }

    fn send(&self, attempt: &HeartbeatAttempt) {
        if let Some(command) = self.settings.send_command.as_deref() {
            self.run_step(Step::Send, command, attempt);
        }
    }

    fn restart(&self, attempt: &HeartbeatAttempt) -> bool {
        match self.settings.restart_command.as_deref() {
            Some(command) => {
                self.logger.warn(format!(
                    "cycle {}: wait schedule exhausted; restarting gateway",
                    attempt.cycle_id
                ));
                self.run_step(Step::Restart, command, attempt)
            }
            None => {
                self.logger.warn(format!(
                    "cycle {}: wait schedule exhausted but no restartCommand is configured",
                    attempt.cycle_id
                ));
                false
            }
        }
    }

    /// Returns whether a notification was attempted.
    fn notify(&self, attempt: &HeartbeatAttempt) -> bool {
        if !self.settings.notify_on_restart {
            return false;
        }
        match self.settings.notify_command.as_deref() {
            Some(command) => {
                self.run_step(Step::Notify, command, attempt);
                true
            }
            None => false,
        }
    }

    /// Run one step; `true` when it exited 0. Failures only log.
    fn run_step(&self, step: Step, template: &str, attempt: &HeartbeatAttempt) -> bool {
        let vars = self.vars_for(&attempt.cycle_id);
        let level_is_warn = !matches!(step, Step::Check | Step::Probe);
        match self.executor.execute(template, &vars) {
            Ok(output) if output.success() => {
                self.logger
                    .debug(format!("cycle {}: {step} ok", attempt.cycle_id));
                true
            }
            Ok(output) => {
                let message = format!(
                    "cycle {}: {step} failed ({})",
                    attempt.cycle_id,
                    output.summary()
                );
                if level_is_warn {
                    self.logger.warn(message);
                } else {
                    self.logger.info(message);
                }
                false
            }
            Err(e) => {
                self.logger
                    .error(format!("cycle {}: {step} could not run: {e}", attempt.cycle_id));
                false
            }
        }
    }

    /// Template variables, re-read from the health cache before every step
    /// because the check command may have just rewritten it.
    fn vars_for(&self, cycle_id: &str) -> TemplateVars {
        let cache = match HealthCache::load(&self.health_cache) {
            Ok(cache) => cache.unwrap_or_default(),
            Err(e) => {
                self.logger.warn(format!("ignoring health cache: {e}"));
                HealthCache::default()
            }
        };
        let agent_id = cache
            .agent_id
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| self.settings.agent_probe.fallback_agent_id.clone());

        TemplateVars::new()
            .with(VAR_CYCLE_ID, cycle_id)
            .with(VAR_REPO_CONFIG, self.repo_config.to_string_lossy())
            .with(VAR_LIVE_CONFIG, self.live_config.to_string_lossy())
            .with(VAR_HEALTH_CACHE, self.health_cache.to_string_lossy())
            .with(VAR_AGENT_ID, agent_id)
            .with_opt(VAR_SESSION_ID, cache.session_id)
            .with_opt(VAR_SESSION_KEY, cache.session_key)
            .with_opt(VAR_SESSIONS_PATH, cache.sessions_path)
    }
}
