//! Pid-file based supervisor for a detached background process.

use super::record::DaemonRecord;
use super::{DaemonStatus, StartOutcome, StopOutcome, Supervisor};
use crate::config::{StatePaths, CONFIG_ENV, STATE_DIR_ENV};
use crate::error::{WardenError, WardenResult};
use crate::fs::ExclusiveLock;
use crate::logging::Logger;
use crate::process::{is_process_alive, terminate};
use std::fs::OpenOptions;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Environment variable naming the warden binary to launch.
pub const BIN_ENV: &str = "WARDEN_BIN";

/// Set to `1` in the environment of the spawned background process.
pub const DAEMON_ENV: &str = "WARDEN_DAEMON";

/// How long `stop` waits for the process to go away after SIGTERM.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// The binary to run in the background: `$WARDEN_BIN`, else this executable.
pub fn warden_binary() -> WardenResult<PathBuf> {
    match std::env::var_os(BIN_ENV) {
        Some(bin) if !bin.is_empty() => Ok(PathBuf::from(bin)),
        _ => std::env::current_exe().map_err(|e| WardenError::io("locate current executable", e)),
    }
}

/// Whether this process was started by [`PidFileSupervisor::start`].
pub fn is_daemon_process() -> bool {
    std::env::var(DAEMON_ENV).is_ok_and(|v| v == "1")
}

#[derive(Debug, Clone)]
pub struct PidFileSupervisor {
    state: StatePaths,
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    logger: Logger,
}

impl PidFileSupervisor {
    /// Supervise an arbitrary command line.
    pub fn new(state: StatePaths, program: impl Into<PathBuf>, args: &[&str], logger: Logger) -> Self {
        Self {
            state,
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            envs: vec![(DAEMON_ENV.to_string(), "1".to_string())],
            logger,
        }
    }

    /// Supervise `warden run` for the config at `config_path`.
    pub fn for_warden(state: StatePaths, config_path: &Path, logger: Logger) -> WardenResult<Self> {
        let program = warden_binary()?;
        let state_dir = state.dir.to_string_lossy().into_owned();
        Ok(Self::new(state, program, &["run"], logger)
            .with_env(CONFIG_ENV, &config_path.to_string_lossy())
            .with_env(STATE_DIR_ENV, &state_dir))
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn pid_file(&self) -> &Path {
        &self.state.pid_file
    }

    fn spawn_detached(&self) -> WardenResult<u32> {
        self.state
            .ensure_dir()
            .map_err(|e| WardenError::io(format!("create {}", self.state.dir.display()), e))?;
        if let Some(parent) = self.state.log_file.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| WardenError::io(format!("create {}", parent.display()), e))?;
        }
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.state.log_file)
            .map_err(|e| WardenError::io(format!("open {}", self.state.log_file.display()), e))?;
        let log_err = log
            .try_clone()
            .map_err(|e| WardenError::io("duplicate log handle", e))?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(log)
            .stderr(log_err);
        // New session: no controlling terminal, and the daemon survives the
        // shell that launched it.
        unsafe {
            command.pre_exec(|| {
                nix::unistd::setsid()
                    .map(|_| ())
                    .map_err(std::io::Error::from)
            });
        }

        let mut child = command.spawn().map_err(|e| WardenError::SubprocessFailure {
            command: self.program.display().to_string(),
            reason: e.to_string(),
        })?;
        let pid = child.id();

        // Reap the child if it exits while we are still alive; once this
        // process exits the daemon is re-parented and reaped by init.
        thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(pid)
    }
}

impl Supervisor for PidFileSupervisor {
    fn start(&self) -> WardenResult<StartOutcome> {
        let _lock = ExclusiveLock::acquire(&self.state.lock_file)?;

        if let Some(record) = DaemonRecord::read(&self.state.pid_file)? {
            if record.is_alive() {
                self.logger
                    .info(format!("daemon already running (pid {})", record.pid));
                return Ok(StartOutcome::AlreadyRunning(record.pid));
            }
            self.logger
                .warn(format!("replacing stale daemon record (pid {})", record.pid));
            DaemonRecord::remove(&self.state.pid_file)?;
        }

        let pid = self.spawn_detached()?;
        DaemonRecord::capture(pid).write(&self.state.pid_file)?;
        self.logger.info(format!(
            "daemon started (pid {pid}), logging to {}",
            self.state.log_file.display()
        ));
        Ok(StartOutcome::Started(pid))
    }

    fn stop(&self) -> WardenResult<StopOutcome> {
        let _lock = ExclusiveLock::acquire(&self.state.lock_file)?;

        let Some(record) = DaemonRecord::read(&self.state.pid_file)? else {
            self.logger.warn("no daemon record; nothing to stop");
            return Ok(StopOutcome::NothingToStop);
        };

        if !record.is_alive() {
            DaemonRecord::remove(&self.state.pid_file)?;
            self.logger
                .warn(format!("daemon (pid {}) was not running; removed stale record", record.pid));
            return Ok(StopOutcome::Stale(record.pid));
        }

        terminate(record.pid).map_err(|e| WardenError::SubprocessFailure {
            command: format!("kill -TERM {}", record.pid),
            reason: e.to_string(),
        })?;
        DaemonRecord::remove(&self.state.pid_file)?;

        if !wait_for_exit(record.pid, STOP_GRACE) {
            self.logger.warn(format!(
                "daemon (pid {}) still alive {}s after SIGTERM",
                record.pid,
                STOP_GRACE.as_secs()
            ));
        }
        self.logger.info(format!("daemon stopped (pid {})", record.pid));
        Ok(StopOutcome::Stopped(record.pid))
    }

    fn status(&self) -> WardenResult<DaemonStatus> {
        Ok(match DaemonRecord::read(&self.state.pid_file)? {
            None => DaemonStatus::NotRunning,
            Some(record) if record.is_alive() => DaemonStatus::Running(record.pid),
            Some(record) => DaemonStatus::Stale(record.pid),
        })
    }
}

fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !is_process_alive(pid) {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    !is_process_alive(pid)
}
