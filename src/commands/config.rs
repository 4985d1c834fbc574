//! `config:pull`, `config:push` and `config:validate`.

use super::common::Context;
use crate::git::CommitOutcome;
use crate::sync::SyncReport;
use anyhow::{Context as _, Result};
use colored::Colorize;

pub fn pull(ctx: &Context) -> Result<()> {
    let engine = ctx.sync_engine();
    let report = engine.pull().context("Failed to pull live config")?;
    println!(
        "{} Pulled {} → {}",
        "✓".green().bold(),
        engine.live_config().display(),
        engine.repo_config().display()
    );
    print_commit(&report);
    Ok(())
}

pub fn push(ctx: &Context) -> Result<()> {
    let engine = ctx.sync_engine();
    let report = engine.push().context("Failed to push managed config")?;
    println!(
        "{} Pushed {} → {}",
        "✓".green().bold(),
        engine.repo_config().display(),
        engine.live_config().display()
    );
    print_commit(&report);
    Ok(())
}

pub fn validate(ctx: &Context) -> Result<()> {
    let engine = ctx.sync_engine();
    engine.validate().with_context(|| {
        format!(
            "{} does not satisfy {}",
            engine.repo_config().display(),
            engine.schema_file().display()
        )
    })?;
    println!(
        "{} {} is valid",
        "✓".green().bold(),
        engine.repo_config().display()
    );
    Ok(())
}

pub(crate) fn print_commit(report: &SyncReport) {
    match report.commit {
        Some(CommitOutcome::Committed) => {
            println!("  {} committed ({} bytes)", "→".cyan().bold(), report.bytes)
        }
        Some(CommitOutcome::Unchanged) => println!("  {} no changes to commit", "─".dimmed()),
        None => {}
    }
}
