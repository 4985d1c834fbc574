//! Single-file version history for the managed config copy.
//!
//! Commits always name exactly one path, so unrelated changes elsewhere in
//! the repository are never swept into a sync commit, and a commit is only
//! made when git reports that file as changed.

use super::runner::{run_git_bool, run_git_checked};
use crate::config::GitConfig;
use crate::error::{WardenError, WardenResult};
use std::path::{Path, PathBuf};

/// Identity used when the repository has none configured.
const FALLBACK_NAME: &str = "warden";
const FALLBACK_EMAIL: &str = "warden@localhost";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The file matches the last commit; nothing was recorded.
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct FileHistory {
    repo_dir: PathBuf,
    file_name: String,
    auto_init: bool,
    message: String,
}

impl FileHistory {
    /// History for `file`, rooted at the file's directory.
    pub fn for_file(file: &Path, git: &GitConfig) -> WardenResult<Self> {
        let repo_dir = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| WardenError::VersionControl {
                operation: "add".to_string(),
                reason: format!("{} has no file name", file.display()),
            })?;
        Ok(Self {
            repo_dir,
            file_name,
            auto_init: git.auto_init,
            message: git.commit_message.clone(),
        })
    }

    /// Make sure the file's directory is inside a work tree.
    ///
    /// Returns `true` when a new repository was initialized.
    pub fn ensure_repo(&self) -> WardenResult<bool> {
        if run_git_bool(&["rev-parse", "--is-inside-work-tree"], &self.repo_dir) {
            return Ok(false);
        }
        if !self.auto_init {
            return Err(WardenError::VersionControl {
                operation: "rev-parse".to_string(),
                reason: format!(
                    "{} is not a git repository and git.autoInit is off",
                    self.repo_dir.display()
                ),
            });
        }
        std::fs::create_dir_all(&self.repo_dir)
            .map_err(|e| WardenError::io(format!("create {}", self.repo_dir.display()), e))?;
        run_git_checked(&["init", "--quiet"], &self.repo_dir)?;
        Ok(true)
    }

    /// Stage the file and commit it if git reports it changed.
    pub fn commit_if_changed(&self) -> WardenResult<CommitOutcome> {
        self.ensure_repo()?;
        run_git_checked(&["add", "--", &self.file_name], &self.repo_dir)?;

        let status = run_git_checked(
            &["status", "--porcelain", "--", &self.file_name],
            &self.repo_dir,
        )?;
        if status.is_empty() {
            return Ok(CommitOutcome::Unchanged);
        }

        let mut args: Vec<String> = Vec::new();
        if !self.has_identity() {
            args.extend([
                "-c".to_string(),
                format!("user.name={FALLBACK_NAME}"),
                "-c".to_string(),
                format!("user.email={FALLBACK_EMAIL}"),
            ]);
        }
        args.extend([
            "commit".to_string(),
            "--quiet".to_string(),
            "-m".to_string(),
            self.message.clone(),
            "--".to_string(),
            self.file_name.clone(),
        ]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_git_checked(&args, &self.repo_dir)?;
        Ok(CommitOutcome::Committed)
    }

    /// Number of commits touching the file. Zero before the first commit.
    #[cfg(test)]
    pub(crate) fn commit_count(&self) -> usize {
        super::runner::run_git(
            &["rev-list", "--count", "HEAD", "--", &self.file_name],
            &self.repo_dir,
        )
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8_lossy(&o.stdout).trim().parse().ok())
        .unwrap_or(0)
    }

    fn has_identity(&self) -> bool {
        run_git_bool(&["config", "user.email"], &self.repo_dir)
    }
}
