//! Background process supervision

use std::sync::Arc;
use std::thread;

use serial_test::serial;
use tempfile::TempDir;

use warden::config::StatePaths;
use warden::daemon::{DaemonStatus, PidFileSupervisor, StartOutcome, StopOutcome, Supervisor};
use warden::logging::Logger;
use warden::process::is_process_alive;

fn sleeper(dir: &TempDir) -> PidFileSupervisor {
    PidFileSupervisor::new(
        StatePaths::in_dir(dir.path()),
        "sleep",
        &["30"],
        Logger::discard(),
    )
}

#[test]
#[serial]
fn test_concurrent_starts_spawn_one_process() {
    let dir = TempDir::new().unwrap();
    let supervisor = Arc::new(sleeper(&dir));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let supervisor = Arc::clone(&supervisor);
            thread::spawn(move || supervisor.start().expect("start failed"))
        })
        .collect();
    let outcomes: Vec<StartOutcome> = handles
        .into_iter()
        .map(|h| h.join().expect("start thread panicked"))
        .collect();

    let started: Vec<u32> = outcomes
        .iter()
        .filter_map(|o| match o {
            StartOutcome::Started(pid) => Some(*pid),
            StartOutcome::AlreadyRunning(_) => None,
        })
        .collect();
    assert_eq!(started.len(), 1, "outcomes: {outcomes:?}");
    let pid = started[0];
    assert!(outcomes.contains(&StartOutcome::AlreadyRunning(pid)));

    assert_eq!(supervisor.stop().unwrap(), StopOutcome::Stopped(pid));
    assert!(!is_process_alive(pid));
}

#[test]
#[serial]
fn test_killed_daemon_is_reported_stale() {
    let dir = TempDir::new().unwrap();
    let supervisor = sleeper(&dir);

    let StartOutcome::Started(pid) = supervisor.start().unwrap() else {
        panic!("expected a fresh start");
    };
    warden::process::terminate(pid).unwrap();
    for _ in 0..100 {
        if !is_process_alive(pid) {
            break;
        }
        thread::sleep(std::time::Duration::from_millis(50));
    }

    assert_eq!(supervisor.status().unwrap(), DaemonStatus::Stale(pid));
    assert_eq!(supervisor.stop().unwrap(), StopOutcome::Stale(pid));
    assert_eq!(supervisor.status().unwrap(), DaemonStatus::NotRunning);
}
