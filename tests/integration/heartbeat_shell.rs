//! Heartbeat cycles driving real shell commands

use std::sync::Arc;
use std::time::Duration;

use warden::heartbeat::CycleReport;
use warden::shutdown::Shutdown;

use super::helpers::*;

#[test]
fn test_gateway_down_checks_three_times_then_restarts_once() {
    let sandbox = Sandbox::with_heartbeat(
        r#"{
      "waitSeconds": [0, 0, 0],
      "checkCommand": "echo check >> checks.log; exit 1",
      "restartCommand": "echo {cycleId} >> restarts.log",
      "notifyCommand": "echo notified >> notify.log"
    }"#,
    );
    let monitor = sandbox
        .context()
        .heartbeat_monitor(Shutdown::new())
        .expect("monitor");

    let report = monitor.run_once().expect("cycle should complete");

    assert_eq!(
        report,
        CycleReport::Restarted {
            attempts: 3,
            restart_ok: true,
            notified: true
        }
    );
    assert_eq!(sandbox.lines_in("checks.log"), 3);
    assert_eq!(sandbox.lines_in("restarts.log"), 1);
    assert_eq!(sandbox.lines_in("notify.log"), 1);
}

#[test]
fn test_recovery_on_second_check_skips_restart() {
    // first check fails, later checks pass
    let sandbox = Sandbox::with_heartbeat(
        r#"{
      "waitSeconds": [0, 0, 0],
      "checkCommand": "echo check >> checks.log; test $(wc -l < checks.log) -ge 2",
      "restartCommand": "echo restart >> restarts.log"
    }"#,
    );
    let monitor = sandbox
        .context()
        .heartbeat_monitor(Shutdown::new())
        .expect("monitor");

    assert_eq!(
        monitor.run_once(),
        Some(CycleReport::Healthy { attempts: 2 })
    );
    assert_eq!(sandbox.lines_in("checks.log"), 2);
    assert_eq!(sandbox.lines_in("restarts.log"), 0);
}

#[test]
fn test_health_cache_feeds_command_variables() {
    let sandbox = Sandbox::with_heartbeat(
        r#"{
      "waitSeconds": [0],
      "checkCommand": "echo {agentId}:{sessionId} > seen.txt"
    }"#,
    );
    let ctx = sandbox.context();
    std::fs::create_dir_all(&ctx.state.dir).unwrap();
    std::fs::write(
        &ctx.state.health_cache,
        r#"{"ok": true, "agentId": "ops", "sessionId": "s-42"}"#,
    )
    .unwrap();

    let monitor = ctx.heartbeat_monitor(Shutdown::new()).expect("monitor");
    assert_eq!(monitor.run_once(), Some(CycleReport::Healthy { attempts: 1 }));

    let seen = std::fs::read_to_string(sandbox.root().join("seen.txt")).unwrap();
    assert_eq!(seen.trim(), "ops:s-42");
}

#[test]
fn test_scheduler_keeps_ticking_and_stops_on_shutdown() {
    let sandbox = Sandbox::with_heartbeat(
        r#"{
      "waitSeconds": [0],
      "checkCommand": "echo tick >> ticks.log"
    }"#,
    );
    let shutdown = Shutdown::new();
    let monitor = Arc::new(
        sandbox
            .context()
            .heartbeat_monitor(shutdown.clone())
            .expect("monitor")
            .with_interval(Duration::from_millis(200)),
    );

    let runner = {
        let monitor = Arc::clone(&monitor);
        std::thread::spawn(move || monitor.run_scheduled())
    };
    std::thread::sleep(Duration::from_millis(700));
    shutdown.trigger();
    runner.join().expect("scheduler panicked");

    let ticks = sandbox.lines_in("ticks.log");
    assert!((3..=5).contains(&ticks), "expected ~4 ticks, got {ticks}");
}
