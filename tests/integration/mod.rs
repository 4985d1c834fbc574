//! Integration tests for warden
//!
//! These exercise the sync engine, watcher, heartbeat and daemon against
//! real files, real git repositories and real shell commands.

pub mod cli;
pub mod daemon_lifecycle;
pub mod heartbeat_shell;
pub mod helpers;
pub mod sync_flow;
pub mod watch_flow;
