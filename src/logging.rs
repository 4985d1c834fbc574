//! Logging collaborator.
//!
//! A [`Logger`] is built once per invocation and handed to every component.
//! It owns its own `tracing` dispatcher, so no global subscriber is ever
//! installed: each line is appended to the log file and, unless the process
//! is the detached daemon (whose stdout already is the log file), mirrored
//! to standard output.

use crate::error::{WardenError, WardenResult};
use std::fmt::Display;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive (e.g. `debug`).
pub const LOG_ENV: &str = "WARDEN_LOG";

#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// Append to `path`, optionally mirroring every line to stdout.
    pub fn to_file(path: &Path, level: &str, mirror_stdout: bool) -> WardenResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| WardenError::io(format!("create {}", parent.display()), e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| WardenError::io(format!("open log file {}", path.display()), e))?;

        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
        let builder = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_target(false)
            .with_env_filter(filter);

        let dispatch = if mirror_stdout {
            Dispatch::new(
                builder
                    .with_writer(std::io::stdout.and(Mutex::new(file)))
                    .finish(),
            )
        } else {
            Dispatch::new(builder.with_writer(Mutex::new(file)).finish())
        };

        Ok(Self { dispatch })
    }

    /// A logger that drops everything. Used by tests.
    pub fn discard() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    /// Run `f` with this logger as the active dispatcher, so plain
    /// `tracing` macros with structured fields land in the log.
    pub fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    pub fn debug(&self, message: impl Display) {
        self.in_scope(|| tracing::debug!("{message}"));
    }

    pub fn info(&self, message: impl Display) {
        self.in_scope(|| tracing::info!("{message}"));
    }

    pub fn warn(&self, message: impl Display) {
        self.in_scope(|| tracing::warn!("{message}"));
    }

    pub fn error(&self, message: impl Display) {
        self.in_scope(|| tracing::error!("{message}"));
    }
}
