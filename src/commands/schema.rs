//! `schema:update`.

use super::common::Context;
use crate::sync::update_schema;
use anyhow::{Context as _, Result};
use colored::Colorize;

pub fn update(ctx: &Context) -> Result<()> {
    let update = update_schema(&ctx.config, &ctx.logger).context("Failed to update schema")?;
    if let Some(checkout) = &update.checkout {
        println!("  {} source {}", "→".cyan().bold(), checkout.display());
    }
    println!(
        "{} Schema {} at {}",
        "✓".green().bold(),
        if update.exported { "exported" } else { "verified" },
        update.schema_file.display()
    );
    Ok(())
}
