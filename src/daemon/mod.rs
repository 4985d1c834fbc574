//! Background process lifecycle: start, stop and status through a pid record.

mod record;
mod supervisor;

pub use record::DaemonRecord;
pub use supervisor::{is_daemon_process, warden_binary, PidFileSupervisor, BIN_ENV, DAEMON_ENV};

use crate::error::WardenResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(u32),
    AlreadyRunning(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped(u32),
    /// The record pointed at a process that no longer exists.
    Stale(u32),
    NothingToStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonStatus {
    Running(u32),
    NotRunning,
    Stale(u32),
}

/// Lifecycle of a single background watchdog.
pub trait Supervisor {
    /// Spawn the background process unless one is already alive.
    fn start(&self) -> WardenResult<StartOutcome>;

    /// Terminate the recorded process and clear the record.
    fn stop(&self) -> WardenResult<StopOutcome>;

    fn status(&self) -> WardenResult<DaemonStatus>;
}
