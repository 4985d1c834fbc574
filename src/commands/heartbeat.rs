//! `heartbeat [--once]`.

use super::common::{signal_shutdown, Context};
use crate::heartbeat::CycleReport;
use anyhow::{bail, Result};
use colored::Colorize;
use std::sync::Arc;

pub fn execute(ctx: &Context, once: bool) -> Result<()> {
    let shutdown = signal_shutdown()?;
    let monitor = Arc::new(ctx.heartbeat_monitor(shutdown)?);

    if !once {
        monitor.run_scheduled();
        return Ok(());
    }

    match monitor.run_once() {
        Some(report) => {
            print_report(&report);
            Ok(())
        }
        None => bail!("Heartbeat cycle did not complete; see {}", ctx.state.log_file.display()),
    }
}

fn print_report(report: &CycleReport) {
    match report {
        CycleReport::Healthy { attempts } => println!(
            "{} Gateway healthy after {} check(s)",
            "✓".green().bold(),
            attempts
        ),
        CycleReport::Restarted {
            attempts,
            restart_ok,
            notified,
        } => {
            let restart = if *restart_ok {
                "restarted".yellow().bold()
            } else {
                "restart failed".red().bold()
            };
            println!(
                "{} Gateway unhealthy after {} check(s); {}{}",
                "✗".red().bold(),
                attempts,
                restart,
                if *notified { ", notification sent" } else { "" }
            );
        }
        CycleReport::Aborted { attempts } => println!(
            "{} Cycle interrupted after {} check(s)",
            "─".dimmed(),
            attempts
        ),
    }
}
