//! `watch`: push the managed copy whenever it is edited.

use super::common::{signal_shutdown, Context};
use crate::sync::watch;
use anyhow::{Context as _, Result};
use colored::Colorize;

pub fn execute(ctx: &Context) -> Result<()> {
    let shutdown = signal_shutdown()?;
    let engine = ctx.sync_engine();
    println!(
        "{} Watching {} (Ctrl-C to stop)",
        "→".cyan().bold(),
        engine.repo_config().display()
    );
    watch(&engine, &shutdown).context("Config watch failed")?;
    Ok(())
}
