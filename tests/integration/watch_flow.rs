//! Watch mode: edits to the managed copy reach the live config

use std::fs;
use std::thread;
use std::time::Duration;

use warden::shutdown::Shutdown;
use warden::sync::watch;

use super::helpers::*;

#[test]
fn test_burst_of_edits_is_pushed_once() {
    let sandbox = Sandbox::new();
    let engine = sandbox.context().sync_engine();
    engine.pull().expect("pull failed");
    assert_eq!(sandbox.commit_count(), 1);

    let shutdown = Shutdown::new();
    let watcher = {
        let engine = engine.clone();
        let shutdown = shutdown.clone();
        thread::spawn(move || watch(&engine, &shutdown))
    };
    // give the watcher time to register
    thread::sleep(Duration::from_millis(500));

    for port in [9001, 9002, 9003] {
        fs::write(
            sandbox.managed(),
            format!("{{\"gateway\": {{\"port\": {port}}}}}\n"),
        )
        .unwrap();
        thread::sleep(Duration::from_millis(20));
    }
    thread::sleep(Duration::from_millis(1500));

    shutdown.trigger();
    watcher
        .join()
        .expect("watch thread panicked")
        .expect("watch failed");

    assert_eq!(
        sandbox.read(&sandbox.live()),
        b"{\"gateway\": {\"port\": 9003}}\n"
    );
    assert_eq!(sandbox.commit_count(), 2);
}

#[test]
fn test_invalid_edit_does_not_stop_watch() {
    let sandbox = Sandbox::new();
    let engine = sandbox.context().sync_engine();
    engine.pull().expect("pull failed");

    let shutdown = Shutdown::new();
    let watcher = {
        let engine = engine.clone();
        let shutdown = shutdown.clone();
        thread::spawn(move || watch(&engine, &shutdown))
    };
    thread::sleep(Duration::from_millis(500));

    fs::write(sandbox.managed(), r#"{"gateway": {"port": "nope"}}"#).unwrap();
    thread::sleep(Duration::from_millis(1000));
    assert_eq!(sandbox.read(&sandbox.live()), LIVE.as_bytes());

    fs::write(sandbox.managed(), "{\"gateway\": {\"port\": 7000}}\n").unwrap();
    thread::sleep(Duration::from_millis(1000));

    shutdown.trigger();
    watcher
        .join()
        .expect("watch thread panicked")
        .expect("watch failed");

    assert_eq!(
        sandbox.read(&sandbox.live()),
        b"{\"gateway\": {\"port\": 7000}}\n"
    );
}

#[test]
fn test_edit_made_before_watch_is_pushed_on_next_save() {
    let sandbox = Sandbox::new();
    let engine = sandbox.context().sync_engine();
    engine.pull().expect("pull failed");

    let edited = "{\"gateway\": {\"port\": 8100}}\n";
    fs::write(sandbox.managed(), edited).unwrap();

    let shutdown = Shutdown::new();
    let watcher = {
        let engine = engine.clone();
        let shutdown = shutdown.clone();
        thread::spawn(move || watch(&engine, &shutdown))
    };
    thread::sleep(Duration::from_millis(500));

    // Saving again without changing anything still has to reach live.
    fs::write(sandbox.managed(), edited).unwrap();
    thread::sleep(Duration::from_millis(1000));

    shutdown.trigger();
    watcher
        .join()
        .expect("watch thread panicked")
        .expect("watch failed");

    assert_eq!(sandbox.read(&sandbox.live()), edited.as_bytes());
}
