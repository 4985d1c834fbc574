//! Interval scheduling with a reentrancy guard.
//!
//! Ticks are measured from the start of the previous tick. Each cycle runs on
//! its own thread; a tick that fires while a cycle is still in flight is
//! skipped, never queued. An error or panic inside a cycle is logged and the
//! schedule carries on: the watchdog must outlive its own failures.

use super::{CycleReport, HeartbeatMonitor};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Holds the in-progress flag; releases it on drop, including on unwind.
#[derive(Debug)]
pub struct CycleGuard {
    flag: Arc<AtomicBool>,
}

impl CycleGuard {
    /// Claim `flag`, or `None` if a cycle already holds it.
    pub fn try_claim(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl HeartbeatMonitor {
    /// Whether a cycle is running right now.
    pub fn is_busy(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Start a cycle on a worker thread unless one is already running.
    pub fn spawn_cycle(self: &Arc<Self>) -> Option<JoinHandle<Option<CycleReport>>> {
        let guard = CycleGuard::try_claim(&self.in_progress)?;
        let monitor = Arc::clone(self);
        Some(thread::spawn(move || {
            let _guard = guard;
            monitor.run_guarded()
        }))
    }

    /// Run one cycle on the calling thread, honoring the guard.
    ///
    /// `None` when another cycle was in flight or this one failed.
    pub fn run_once(&self) -> Option<CycleReport> {
        let _guard = CycleGuard::try_claim(&self.in_progress)?;
        self.run_guarded()
    }

    fn run_guarded(&self) -> Option<CycleReport> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run_cycle())) {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                self.logger.error(format!("heartbeat cycle failed: {e}"));
                None
            }
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                self.logger.error(format!("heartbeat cycle panicked: {reason}"));
                None
            }
        }
    }

    /// Tick until shutdown. The first tick fires immediately.
    pub fn run_scheduled(self: &Arc<Self>) {
        self.logger.info(format!(
            "heartbeat every {}s, waits {:?}",
            self.interval.as_secs(),
            self.waits.iter().map(|w| w.as_secs()).collect::<Vec<_>>()
        ));

        let mut in_flight: Option<JoinHandle<Option<CycleReport>>> = None;
        loop {
            let tick_start = Instant::now();
            match self.spawn_cycle() {
                Some(handle) => in_flight = Some(handle),
                None => self
                    .logger
                    .debug("previous heartbeat cycle still running; tick skipped"),
            }

            let next_tick = tick_start + self.interval;
            let remaining = next_tick.saturating_duration_since(Instant::now());
            if self.shutdown.wait(remaining) {
                break;
            }
        }

        if let Some(handle) = in_flight {
            let _ = handle.join();
        }
        self.logger.info("heartbeat stopped");
    }
}
