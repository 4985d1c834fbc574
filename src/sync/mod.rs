//! Managed-config synchronization: pull, push, validate, watch.
//!
//! The managed copy is the only file under version control. The live file is
//! only ever written through an atomic replace, and only after the managed
//! copy passes schema validation. Git failures are downgraded to warnings:
//! by the time the commit step runs, the config on disk is already correct.

pub mod schema;
pub mod validate;
pub mod watch;

pub use schema::{update_schema, SchemaUpdate};
pub use validate::{
    collect_violations, compile_schema, parse_document, validate_bytes, validate_file,
};
pub use watch::{debounce_events, watch, DEBOUNCE_WINDOW};

use crate::config::{GitConfig, WardenConfig};
use crate::error::{WardenError, WardenResult};
use crate::fs::{atomic_write, content_digest};
use crate::git::{git_available, CommitOutcome, FileHistory};
use crate::logging::Logger;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// What a pull or push did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// SHA-256 of the bytes that were written.
    pub digest: String,
    pub bytes: usize,
    /// `None` when git is disabled or the commit step failed.
    pub commit: Option<CommitOutcome>,
}

#[derive(Debug, Clone)]
pub struct ConfigSyncEngine {
    repo_config: PathBuf,
    live_config: PathBuf,
    schema_file: PathBuf,
    git: GitConfig,
    logger: Logger,
}

impl ConfigSyncEngine {
    pub fn new(config: &WardenConfig, logger: Logger) -> Self {
        Self {
            repo_config: config.repo_config_path(),
            live_config: config.live_config_path(),
            schema_file: config.schema_file_path(),
            git: config.git.clone(),
            logger,
        }
    }

    pub fn repo_config(&self) -> &Path {
        &self.repo_config
    }

    pub fn live_config(&self) -> &Path {
        &self.live_config
    }

    pub fn schema_file(&self) -> &Path {
        &self.schema_file
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Copy the live config onto the managed copy and record it.
    pub fn pull(&self) -> WardenResult<SyncReport> {
        if !self.live_config.is_file() {
            return Err(WardenError::LiveConfigMissing(self.live_config.clone()));
        }
        let contents = std::fs::read(&self.live_config)
            .map_err(|e| WardenError::io(format!("read {}", self.live_config.display()), e))?;
        atomic_write(&self.repo_config, &contents)?;
        self.logger.info(format!(
            "pulled {} -> {}",
            self.live_config.display(),
            self.repo_config.display()
        ));

        Ok(SyncReport {
            digest: content_digest(&contents),
            bytes: contents.len(),
            commit: self.record_history(),
        })
    }

    /// Validate the managed copy, then atomically replace the live config.
    ///
    /// On any validation failure the live file is left untouched. The managed
    /// copy is read once; the bytes that passed validation are the bytes
    /// written, even if an editor saves again mid-push.
    pub fn push(&self) -> WardenResult<SyncReport> {
        let contents = std::fs::read(&self.repo_config)
            .map_err(|e| WardenError::io(format!("read {}", self.repo_config.display()), e))?;
        validate_bytes(&contents, &self.repo_config, &self.schema_file)?;
        atomic_write(&self.live_config, &contents)?;
        self.logger.info(format!(
            "pushed {} -> {}",
            self.repo_config.display(),
            self.live_config.display()
        ));

        Ok(SyncReport {
            digest: content_digest(&contents),
            bytes: contents.len(),
            commit: self.record_history(),
        })
    }

    /// Parse the managed copy and check it against the schema.
    pub fn validate(&self) -> WardenResult<Value> {
        validate_file(&self.repo_config, &self.schema_file)
    }

    /// Seed the managed copy from the live config if it does not exist yet,
    /// otherwise just make sure it is under version control.
    pub fn init(&self) -> WardenResult<SyncReport> {
        if !self.repo_config.exists() {
            return self.pull();
        }
        self.logger.info(format!(
            "managed config already present at {}",
            self.repo_config.display()
        ));
        let contents = std::fs::read(&self.repo_config)
            .map_err(|e| WardenError::io(format!("read {}", self.repo_config.display()), e))?;
        Ok(SyncReport {
            digest: content_digest(&contents),
            bytes: contents.len(),
            commit: self.record_history(),
        })
    }

    /// Commit the managed copy if it changed. Never fails the caller.
    pub fn record_history(&self) -> Option<CommitOutcome> {
        if !self.git.enabled {
            return None;
        }
        if !git_available() {
            self.logger
                .warn("git not found on PATH; version history not updated");
            return None;
        }
        let outcome = FileHistory::for_file(&self.repo_config, &self.git)
            .and_then(|history| history.commit_if_changed());
        match outcome {
            Ok(CommitOutcome::Committed) => {
                self.logger
                    .info(format!("committed {}", self.repo_config.display()));
                Some(CommitOutcome::Committed)
            }
            Ok(CommitOutcome::Unchanged) => {
                self.logger.debug("managed config unchanged; no commit");
                Some(CommitOutcome::Unchanged)
            }
            Err(e) => {
                self.logger.warn(format!("version history not updated: {e}"));
                None
            }
        }
    }
}
