//! A second run waits for the lock, then gives up quietly without touching files.

use assert_fs::TempDir;
use assert_fs::prelude::*;
use std::time::Duration;

use vfo::{Config, GuessExtractor, JsonFailureStore, RunGuard};

#[test]
fn locked_out_run_touches_nothing() {
    let td = TempDir::new().unwrap();
    td.child("inbox/Westworld.S01E01.mkv").write_str("x").unwrap();
    td.child("series/Westworld").create_dir_all().unwrap();
    td.child("rule_book.xml")
        .write_str(r#"<rulebook><series name="Westworld">parent-dir</series></rulebook>"#)
        .unwrap();
    let mut cfg = Config::new(
        td.child("inbox").path(),
        vec![td.child("series").to_path_buf()],
        td.child("rule_book.xml").path(),
    );
    cfg.lock_file = td.child("vfo.lock").to_path_buf();
    cfg.failure_store = td.child("failures.json").to_path_buf();
    cfg.lock_timeout = Duration::from_millis(200);

    let held = RunGuard::acquire(&cfg.lock_file, Duration::ZERO).unwrap().unwrap();
    let mut store = JsonFailureStore::open(&cfg.failure_store).unwrap();
    let summary = vfo::run(&cfg, &GuessExtractor, &mut store).unwrap();
    assert!(summary.locked_out);
    assert!(summary.moved.is_empty());
    td.child("inbox/Westworld.S01E01.mkv").assert(predicates::path::exists());
    td.child("series/Westworld/Westworld.S01E01.mkv")
        .assert(predicates::path::missing());

    drop(held);
    let summary = vfo::run(&cfg, &GuessExtractor, &mut store).unwrap();
    assert!(!summary.locked_out);
    assert_eq!(summary.moved.len(), 1);
    td.child("series/Westworld/Westworld.S01E01.mkv")
        .assert(predicates::path::exists());
}

#[test]
fn binary_exits_cleanly_when_lock_times_out() {
    let td = TempDir::new().unwrap();
    td.child("inbox/Westworld.S01E01.mkv").write_str("x").unwrap();
    td.child("series/Westworld").create_dir_all().unwrap();
    td.child("rule_book.xml")
        .write_str(r#"<rulebook><series name="Westworld">parent-dir</series></rulebook>"#)
        .unwrap();
    let root = td.path().display();
    td.child("config.xml")
        .write_str(&format!(
            "<config>\n  <input_dir>{root}/inbox</input_dir>\n  <series_dir>{root}/series</series_dir>\n  <rulebook>{root}/rule_book.xml</rulebook>\n  <failure_store>{root}/failures.json</failure_store>\n  <lock_file>{root}/vfo.lock</lock_file>\n  <lock_timeout_seconds>0</lock_timeout_seconds>\n  <log_level>quiet</log_level>\n</config>\n"
        ))
        .unwrap();

    let _held = RunGuard::acquire(td.child("vfo.lock").path(), Duration::ZERO)
        .unwrap()
        .unwrap();
    assert_cmd::Command::cargo_bin("vfo")
        .unwrap()
        .env_remove("VFO_CONFIG")
        .arg("--config")
        .arg(td.child("config.xml").path())
        .assert()
        .success()
        .stderr(predicates::str::contains("holds the lock"));
    td.child("inbox/Westworld.S01E01.mkv").assert(predicates::path::exists());
    td.child("series/Westworld/Westworld.S01E01.mkv")
        .assert(predicates::path::missing());
}
