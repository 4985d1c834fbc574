//! The `warden` binary end to end

use std::fs;
use std::process::{Command, Output};

use serial_test::serial;

use super::helpers::*;

fn warden(sandbox: &Sandbox, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_warden"))
        .args(args)
        .arg("--config")
        .arg(sandbox.config_file())
        .env("WARDEN_STATE_DIR", sandbox.state_dir())
        .env_remove("WARDEN_CONFIG")
        .env_remove("WARDEN_BIN")
        .env_remove("WARDEN_DAEMON")
        .output()
        .expect("Failed to run warden")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_pull_push_and_validate() {
    let sandbox = Sandbox::new();

    assert!(warden(&sandbox, &["pull"]).status.success());
    assert!(sandbox.managed().is_file());
    assert!(warden(&sandbox, &["config:validate"]).status.success());
    assert!(warden(&sandbox, &["config:push"]).status.success());
    assert_eq!(sandbox.read(&sandbox.live()), LIVE.as_bytes());
}

#[test]
fn test_validate_fails_with_violation_path() {
    let sandbox = Sandbox::new();
    fs::create_dir_all(sandbox.managed().parent().unwrap()).unwrap();
    fs::write(sandbox.managed(), r#"{"gateway": {"port": "x"}}"#).unwrap();

    let output = warden(&sandbox, &["validate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("/gateway/port"));
}

#[test]
fn test_missing_config_is_an_error() {
    let sandbox = Sandbox::new();
    fs::remove_file(sandbox.config_file()).unwrap();
    assert!(!warden(&sandbox, &["daemon:status"]).status.success());
}

#[test]
fn test_unknown_command_fails() {
    let sandbox = Sandbox::new();
    assert!(!warden(&sandbox, &["frobnicate"]).status.success());
}

#[test]
fn test_service_template_points_at_config() {
    let sandbox = Sandbox::new();
    let output = warden(&sandbox, &["service:template", "--platform", "systemd"]);
    assert!(output.status.success());
    let unit = stdout(&output);
    assert!(unit.contains("[Service]"));
    assert!(unit.contains(&sandbox.config_file().display().to_string()));
}

#[test]
#[serial]
fn test_daemon_start_status_stop() {
    let sandbox = Sandbox::new();
    assert!(warden(&sandbox, &["init"]).status.success());

    let started = warden(&sandbox, &["daemon:start"]);
    assert!(started.status.success());
    assert!(stdout(&started).contains("Daemon started"));

    let again = warden(&sandbox, &["daemon:start"]);
    assert!(stdout(&again).contains("already running"));

    let status = warden(&sandbox, &["daemon:status"]);
    assert!(stdout(&status).contains("Daemon running"));

    let stopped = warden(&sandbox, &["daemon:stop"]);
    assert!(stopped.status.success());
    assert!(stdout(&stopped).contains("Daemon stopped"));
    assert!(stdout(&warden(&sandbox, &["daemon:status"])).contains("not running"));
}
