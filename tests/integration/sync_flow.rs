//! Pull, push, validate and init against a real git repository

use std::fs;

use warden::git::CommitOutcome;
use warden::WardenError;

use super::helpers::*;

#[test]
fn test_pull_then_push_round_trip_is_byte_identical() {
    let sandbox = Sandbox::new();
    let engine = sandbox.context().sync_engine();

    let pulled = engine.pull().expect("pull failed");
    assert_eq!(pulled.commit, Some(CommitOutcome::Committed));
    assert_eq!(sandbox.read(&sandbox.managed()), LIVE.as_bytes());

    engine.push().expect("push failed");
    assert_eq!(sandbox.read(&sandbox.live()), LIVE.as_bytes());
}

#[test]
fn test_push_of_unchanged_content_adds_no_commit() {
    let sandbox = Sandbox::new();
    let engine = sandbox.context().sync_engine();

    engine.pull().expect("pull failed");
    assert_eq!(sandbox.commit_count(), 1);

    let pushed = engine.push().expect("push failed");
    assert_eq!(pushed.commit, Some(CommitOutcome::Unchanged));
    let pulled_again = engine.pull().expect("second pull failed");
    assert_eq!(pulled_again.commit, Some(CommitOutcome::Unchanged));
    assert_eq!(sandbox.commit_count(), 1);
}

#[test]
fn test_edited_managed_copy_is_pushed_and_committed() {
    let sandbox = Sandbox::new();
    let engine = sandbox.context().sync_engine();
    engine.pull().expect("pull failed");

    let edited = "{\"gateway\": {\"port\": 9000}}\n";
    fs::write(sandbox.managed(), edited).unwrap();
    let report = engine.push().expect("push failed");

    assert_eq!(report.commit, Some(CommitOutcome::Committed));
    assert_eq!(sandbox.read(&sandbox.live()), edited.as_bytes());
    assert_eq!(sandbox.commit_count(), 2);
}

#[test]
fn test_schema_violation_leaves_live_untouched() {
    let sandbox = Sandbox::new();
    let engine = sandbox.context().sync_engine();
    engine.pull().expect("pull failed");

    fs::write(sandbox.managed(), r#"{"gateway": {"port": "x"}}"#).unwrap();
    let err = engine.push().expect_err("push of invalid config must fail");

    match err {
        WardenError::SchemaValidation { violations } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].path, "/gateway/port");
        }
        other => panic!("expected SchemaValidation, got {other:?}"),
    }
    assert_eq!(sandbox.read(&sandbox.live()), LIVE.as_bytes());
    assert_eq!(sandbox.commit_count(), 1);
}

#[test]
fn test_every_violation_is_reported() {
    let sandbox = Sandbox::new();
    let engine = sandbox.context().sync_engine();
    fs::create_dir_all(sandbox.managed().parent().unwrap()).unwrap();
    fs::write(
        sandbox.managed(),
        r#"{"gateway": {"port": 0, "bind": 7}}"#,
    )
    .unwrap();

    let Err(WardenError::SchemaValidation { violations }) = engine.validate() else {
        panic!("expected schema violations");
    };
    let mut paths: Vec<_> = violations.iter().map(|v| v.path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["/gateway/bind", "/gateway/port"]);
}

#[test]
fn test_malformed_managed_copy_is_not_schema_checked() {
    let sandbox = Sandbox::new();
    let engine = sandbox.context().sync_engine();
    fs::create_dir_all(sandbox.managed().parent().unwrap()).unwrap();
    fs::write(sandbox.managed(), "{ \"gateway\": ").unwrap();
    fs::remove_file(sandbox.root().join("schema/config.schema.json")).unwrap();

    assert!(matches!(
        engine.push(),
        Err(WardenError::MalformedConfig { .. })
    ));
    assert_eq!(sandbox.read(&sandbox.live()), LIVE.as_bytes());
}

#[test]
fn test_pull_without_live_config_fails() {
    let sandbox = Sandbox::new();
    fs::remove_file(sandbox.live()).unwrap();
    let engine = sandbox.context().sync_engine();

    assert!(matches!(
        engine.pull(),
        Err(WardenError::LiveConfigMissing(_))
    ));
    assert!(!sandbox.managed().exists());
}

#[test]
fn test_init_seeds_once_and_keeps_local_edits() {
    let sandbox = Sandbox::new();
    let engine = sandbox.context().sync_engine();

    engine.init().expect("init failed");
    assert_eq!(sandbox.read(&sandbox.managed()), LIVE.as_bytes());
    assert_eq!(sandbox.commit_count(), 1);

    let edited = "{\"gateway\": {\"port\": 1}}\n";
    fs::write(sandbox.managed(), edited).unwrap();
    let report = engine.init().expect("second init failed");

    assert_eq!(report.commit, Some(CommitOutcome::Committed));
    assert_eq!(sandbox.read(&sandbox.managed()), edited.as_bytes());
    assert_eq!(sandbox.read(&sandbox.live()), LIVE.as_bytes());
}
