//! `run`: the foreground watchdog. Watches the managed copy and runs the
//! heartbeat schedule until SIGINT/SIGTERM.

use super::common::{signal_shutdown, Context};
use crate::sync::watch;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub fn execute(ctx: &Context) -> Result<()> {
    let shutdown = signal_shutdown()?;
    let logger = ctx.logger.clone();
    logger.info(format!(
        "watchdog started (pid {}, config {})",
        std::process::id(),
        ctx.config_path().display()
    ));

    let engine = ctx.sync_engine();
    let watch_shutdown = shutdown.clone();
    let watcher = thread::Builder::new()
        .name("config-watch".to_string())
        .spawn(move || {
            if let Err(e) = watch(&engine, &watch_shutdown) {
                engine.logger().error(format!("config watch stopped: {e}"));
            }
        })?;

    if ctx.config.heartbeat.check_command.is_some() {
        let monitor = Arc::new(ctx.heartbeat_monitor(shutdown.clone())?);
        monitor.run_scheduled();
    } else {
        logger.warn("heartbeat.checkCommand not configured; running config watch only");
        while !shutdown.wait(Duration::from_secs(3600)) {}
    }

    logger.info("shutting down");
    watcher
        .join()
        .map_err(|_| anyhow!("config watch thread panicked"))?;
    logger.info("watchdog stopped");
    Ok(())
}
