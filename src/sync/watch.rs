//! Watch the managed copy and push it when it changes.
//!
//! Editors tend to produce several events per save (truncate, write, chmod,
//! or write-temp-then-rename), so events are debounced: a push fires once the
//! file has been quiet for [`DEBOUNCE_WINDOW`]. The directory is watched
//! rather than the file, because a rename-based save replaces the inode.

use super::ConfigSyncEngine;
use crate::error::{WardenError, WardenResult};
use crate::fs::content_digest;
use crate::shutdown::Shutdown;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

/// Quiet period that ends a burst of change events.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// How often an idle loop re-checks for shutdown.
const IDLE_POLL: Duration = Duration::from_millis(500);

/// Coalesce bursts from `events` and call `on_burst` once per burst.
///
/// Returns when shutdown is triggered or the sender side hangs up.
pub fn debounce_events(
    events: &Receiver<()>,
    window: Duration,
    shutdown: &Shutdown,
    mut on_burst: impl FnMut(),
) {
    loop {
        if shutdown.is_triggered() {
            return;
        }
        match events.recv_timeout(IDLE_POLL) {
            Ok(()) => {}
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        }

        // Extend the burst until the window passes with no new event.
        let mut hung_up = false;
        loop {
            match events.recv_timeout(window) {
                Ok(()) => continue,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    hung_up = true;
                    break;
                }
            }
        }

        if shutdown.is_triggered() {
            return;
        }
        on_burst();
        if hung_up {
            return;
        }
    }
}

fn is_relevant(event: &Event, file_name: &OsString) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    );
    kind_matches
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

/// Watch the engine's managed copy until shutdown, pushing after each burst
/// of edits. Push failures are logged; the watch keeps running.
pub fn watch(engine: &ConfigSyncEngine, shutdown: &Shutdown) -> WardenResult<()> {
    let managed = engine.repo_config().to_path_buf();
    let dir = match managed.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    let file_name = managed
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| WardenError::io(
            format!("watch {}", managed.display()),
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        ))?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| WardenError::io(format!("create {}", dir.display()), e))?;

    let (tx, rx) = mpsc::channel();
    let logger = engine.logger().clone();
    let filter_name = file_name.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_relevant(&event, &filter_name) => {
            let _ = tx.send(());
        }
        Ok(_) => {}
        Err(e) => logger.warn(format!("file watcher error: {e}")),
    })
    .map_err(|e| watch_error(&dir, e))?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| watch_error(&dir, e))?;

    let logger = engine.logger();
    logger.info(format!("watching {}", managed.display()));

    // Compare against what is live, not the managed copy: edits made while
    // nothing was watching have not been pushed yet.
    let mut last_digest = current_digest(engine.live_config());
    debounce_events(&rx, DEBOUNCE_WINDOW, shutdown, || {
        let digest = current_digest(&managed);
        if digest.is_some() && digest == last_digest {
            logger.debug("change notification without content change; skipping push");
            return;
        }
        match engine.push() {
            Ok(report) => last_digest = Some(report.digest),
            Err(e) => logger.error(format!("push after edit failed: {e}")),
        }
    });

    logger.info("watch stopped");
    Ok(())
}

fn current_digest(path: &Path) -> Option<String> {
    std::fs::read(path).ok().map(|bytes| content_digest(&bytes))
}

fn watch_error(dir: &Path, e: notify::Error) -> WardenError {
    WardenError::io(
        format!("watch {}", dir.display()),
        std::io::Error::other(e.to_string()),
    )
}
