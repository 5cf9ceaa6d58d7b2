//! Watch configuration read from a taskfile, and what a batch of changes
//! triggers.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use conveyor_lib::watch::{WatchConfig, WatchError, watch};

use super::common::Project;

#[test]
fn reads_resolved_patterns() {
  let project = Project::picker();
  let config = WatchConfig::from_orchestrator(&project.orchestrator(), &[] as &[&str]).unwrap();

  assert_eq!(config.targets.len(), 1);
  assert_eq!(config.targets[0].patterns, vec!["_source/lib/**/*.js"]);
  assert_eq!(config.targets[0].tasks, vec!["build"]);
}

#[test]
fn changes_map_to_targets() {
  let project = Project::picker();
  let config = WatchConfig::from_orchestrator(&project.orchestrator(), &["lib"]).unwrap();

  let changed = vec![
    PathBuf::from("_source/lib/datepicker.js"),
    PathBuf::from("_source/lib/translations/de_DE.js"),
  ];
  let affected = config.affected(&changed);
  assert_eq!(affected.len(), 1);
  assert_eq!(affected[0].name, "lib");

  assert!(config.affected(&[PathBuf::from("README.md")]).is_empty());
}

#[test]
fn unknown_target_is_rejected() {
  let project = Project::picker();
  let err = WatchConfig::from_orchestrator(&project.orchestrator(), &["docs"]).unwrap_err();
  assert!(matches!(err, WatchError::UnknownTarget(ref name) if name == "docs"));
}

#[test]
fn triggered_run_rebuilds() {
  let project = Project::picker();
  let orchestrator = project.orchestrator();
  let config = WatchConfig::from_orchestrator(&orchestrator, &[] as &[&str]).unwrap();

  project.write("_source/lib/basepicker.js", "var basepicker = 2;");
  for target in config.affected(&[PathBuf::from("_source/lib/basepicker.js")]) {
    let report = orchestrator.run_all(&target.tasks).unwrap();
    assert!(report.is_success());
  }
  assert!(project.read("lib/pickadate.date.js").contains("var basepicker = 2;"));
}

#[test]
fn watching_rebuilds_on_change() {
  let project = Project::picker();
  let orchestrator = project.orchestrator();
  let config = WatchConfig::from_orchestrator(&orchestrator, &[] as &[&str]).unwrap();

  project.write("_source/lib/basepicker.js", "var basepicker = 2;");

  // Keep adding sources until the first run is seen, so a change that lands
  // before the watcher is ready is not the only one.
  let done = Arc::new(AtomicBool::new(false));
  let writer = {
    let done = Arc::clone(&done);
    let lib = project.path().join("_source/lib");
    thread::spawn(move || {
      for i in 0..100 {
        if done.load(Ordering::SeqCst) {
          break;
        }
        std::fs::write(lib.join(format!("extra{i}.js")), "var extra = 1;").unwrap();
        thread::sleep(Duration::from_millis(100));
      }
    })
  };

  let mut runs = Vec::new();
  watch(&orchestrator, &config, |target, result| {
    runs.push((target.name.clone(), result.unwrap().is_success()));
    ControlFlow::Break(())
  })
  .unwrap();
  done.store(true, Ordering::SeqCst);
  writer.join().unwrap();

  assert_eq!(runs, vec![("lib".to_string(), true)]);
  assert!(project.read("lib/pickadate.date.js").contains("var basepicker = 2;"));
}
