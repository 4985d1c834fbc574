//! Git command runner
//!
//! Thin wrappers over `Command::new("git")` with consistent error mapping.

use crate::error::{WardenError, WardenResult};
use std::path::Path;
use std::process::{Command, Output};

/// Run a git command in `repo_root` and return the raw output.
pub fn run_git(args: &[&str], repo_root: &Path) -> WardenResult<Output> {
    Command::new("git")
        .args(args)
        .current_dir(repo_root)
        .output()
        .map_err(|e| WardenError::VersionControl {
            operation: args.join(" "),
            reason: e.to_string(),
        })
}

/// Run a git command, require success, and return trimmed stdout.
pub fn run_git_checked(args: &[&str], repo_root: &Path) -> WardenResult<String> {
    let output = run_git(args, repo_root)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let operation = args.first().copied().unwrap_or("").to_string();
        return Err(WardenError::VersionControl {
            operation,
            reason: stderr.trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a git command and report only whether it exited 0.
pub fn run_git_bool(args: &[&str], repo_root: &Path) -> bool {
    run_git(args, repo_root)
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Whether a `git` binary is on PATH.
pub fn git_available() -> bool {
    which::which("git").is_ok()
}
