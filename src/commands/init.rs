//! `init`: seed the managed copy and put it under version control.

use super::common::Context;
use super::config::print_commit;
use anyhow::{Context as _, Result};
use colored::Colorize;

pub fn execute(ctx: &Context) -> Result<()> {
    let engine = ctx.sync_engine();
    let seeded = !engine.repo_config().exists();
    let report = engine.init().context("Failed to initialize managed config")?;

    if seeded {
        println!(
            "{} Seeded {} from {}",
            "✓".green().bold(),
            engine.repo_config().display(),
            engine.live_config().display()
        );
    } else {
        println!(
            "{} Managed config already present at {}",
            "─".dimmed(),
            engine.repo_config().display()
        );
    }
    print_commit(&report);

    if !engine.schema_file().exists() {
        println!(
            "  {} no schema at {}; run {} before pushing",
            "!".yellow().bold(),
            engine.schema_file().display(),
            "warden schema:update".bold()
        );
    }
    Ok(())
}
