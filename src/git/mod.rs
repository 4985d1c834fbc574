//! Git plumbing for the managed config's version history.

pub mod history;
pub mod runner;

pub use history::{CommitOutcome, FileHistory};
pub use runner::{git_available, run_git, run_git_bool, run_git_checked};
