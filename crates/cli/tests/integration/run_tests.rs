//! `conveyor run` against the picker fixture.

use predicates::prelude::*;

use super::common::TestEnv;

const DATE_JS: &str = "/*! pickadate.js v3.0.0 | MIT */\n(function( $ ) {\nvar datepicker = 1;\nvar basepicker = 1;\n})( jQuery );\n";

#[test]
fn run_default_builds_library() {
  let env = TestEnv::picker();

  env
    .cmd()
    .arg("run")
    .assert()
    .success()
    .stdout(predicate::str::contains("concat:lib"))
    .stdout(predicate::str::contains("Done: 3 step(s)"));

  assert_eq!(env.read_file("lib/pickadate.date.js"), DATE_JS);
  assert!(env.path().join("pickadate.jquery.json").exists());
}

#[test]
fn run_single_target() {
  let env = TestEnv::picker();

  env.cmd().args(["run", "copy:pkg"]).assert().success();

  assert!(env.path().join("pickadate.jquery.json").exists());
  assert!(!env.path().join("lib").exists());
}

#[test]
fn run_unknown_task_fails_without_side_effects() {
  let env = TestEnv::picker();

  env
    .cmd()
    .args(["run", "build", "deploy"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("task not found: 'deploy'"));

  assert!(!env.path().join("lib").exists());
}

#[test]
fn run_stops_at_first_failure() {
  let env = TestEnv::picker();

  env
    .cmd()
    .args(["run", "broken"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("copy:missing"));

  // Steps before the failure keep their outputs.
  assert_eq!(env.read_file("lib/pickadate.date.js"), DATE_JS);
}

#[test]
fn run_json_reports_steps() {
  let env = TestEnv::picker();

  let output = env.cmd().args(["--output", "json", "run", "build"]).output().unwrap();
  assert!(output.status.success());

  let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(summary["success"], true);
  assert_eq!(summary["status"]["state"], "completed");
  assert_eq!(summary["tasks"], serde_json::json!(["build"]));
  assert_eq!(summary["completed"].as_array().unwrap().len(), 3);
  assert_eq!(summary["completed"][1]["step"]["task"], "concat");
}

#[test]
fn run_json_reports_failure() {
  let env = TestEnv::picker();

  let output = env.cmd().args(["--output", "json", "run", "broken"]).output().unwrap();
  assert!(!output.status.success());

  let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(summary["success"], false);
  assert_eq!(summary["status"]["state"], "failed");
  assert_eq!(summary["failed"]["step"]["target"], "missing");
}

#[test]
fn base_overrides_taskfile_directory() {
  let env = TestEnv::picker();
  let taskfile = env.path().join("conveyor.yml");
  let elsewhere = tempfile::TempDir::new().unwrap();

  env
    .cmd()
    .current_dir(elsewhere.path())
    .arg("-f")
    .arg(&taskfile)
    .arg("--base")
    .arg(env.path())
    .args(["run", "build"])
    .assert()
    .success();

  assert!(env.path().join("lib/pickadate.date.js").exists());
}
