//! `daemon:start`, `daemon:stop` and `daemon:status`.

use super::common::Context;
use crate::daemon::{DaemonStatus, PidFileSupervisor, StartOutcome, StopOutcome, Supervisor};
use anyhow::{Context as _, Result};
use colored::Colorize;

fn supervisor(ctx: &Context) -> Result<PidFileSupervisor> {
    let supervisor =
        PidFileSupervisor::for_warden(ctx.state.clone(), ctx.config_path(), ctx.logger.clone())?;
    Ok(supervisor)
}

pub fn start(ctx: &Context) -> Result<()> {
    match supervisor(ctx)?.start().context("Failed to start daemon")? {
        StartOutcome::Started(pid) => {
            println!("{} Daemon started (pid {})", "✓".green().bold(), pid);
            println!("  {} log: {}", "→".cyan().bold(), ctx.state.log_file.display());
        }
        StartOutcome::AlreadyRunning(pid) => {
            println!("{} Daemon already running (pid {})", "─".dimmed(), pid)
        }
    }
    Ok(())
}

pub fn stop(ctx: &Context) -> Result<()> {
    match supervisor(ctx)?.stop().context("Failed to stop daemon")? {
        StopOutcome::Stopped(pid) => {
            println!("{} Daemon stopped (pid {})", "✓".green().bold(), pid)
        }
        StopOutcome::Stale(pid) => println!(
            "{} Daemon was not running; removed stale record (pid {})",
            "!".yellow().bold(),
            pid
        ),
        StopOutcome::NothingToStop => println!("{} Daemon is not running", "─".dimmed()),
    }
    Ok(())
}

pub fn status(ctx: &Context) -> Result<()> {
    match supervisor(ctx)?.status()? {
        DaemonStatus::Running(pid) => {
            println!("{} Daemon running (pid {})", "●".green().bold(), pid)
        }
        DaemonStatus::NotRunning => println!("{} Daemon not running", "○".dimmed()),
        DaemonStatus::Stale(pid) => println!(
            "{} Daemon not running (stale record for pid {})",
            "!".yellow().bold(),
            pid
        ),
    }
    Ok(())
}
