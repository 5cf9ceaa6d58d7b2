//! End-to-end runs of the picker taskfile.

use conveyor_lib::orchestrator::{RunError, RunState};
use conveyor_lib::util::hash::hash_directory;

use super::common::Project;

const DATE_JS: &str = "/*! pickadate.js v3.0.0 | MIT */\n(function( $ ) {\nvar datepicker = 1;\nvar basepicker = 1;\n})( jQuery );\n";

#[test]
fn build_produces_library_files() {
  let project = Project::picker();
  let report = project.orchestrator().run("build").unwrap();

  assert!(report.is_success(), "build failed: {:?}", report.failed);
  assert_eq!(report.status(), RunState::Completed);
  let steps: Vec<String> = report.completed.iter().map(|s| s.step.to_string()).collect();
  assert_eq!(steps, vec!["clean:lib", "concat:lib", "copy:lib", "copy:pkg"]);

  assert_eq!(project.read("lib/pickadate.date.js"), DATE_JS);
  assert!(project.read("lib/pickadate.time.js").contains("var timepicker = 1;\nvar basepicker = 1;"));
  assert_eq!(project.read("lib/translations/de_DE.js"), "de");
  assert_eq!(project.read("lib/translations/fr_FR.js"), "fr");
  assert!(project.read("pickadate.jquery.json").contains("\"version\": \"3.0.0\""));
}

#[test]
fn site_processes_text_and_keeps_binaries() {
  let project = Project::picker();
  let report = project.orchestrator().run("site").unwrap();
  assert!(report.is_success(), "site failed: {:?}", report.failed);

  // Only the curly set is active; config tags stay literal.
  assert_eq!(project.read("site/index.htm"), "<title>pickadate.js</title><%= keep %>");
  let logo = std::fs::read(project.path().join("site/images/logo.png")).unwrap();
  assert_eq!(logo, vec![0x89, b'{', b'%']);
}

#[test]
fn default_runs_build_then_site() {
  let project = Project::picker();
  let report = project.orchestrator().run("default").unwrap();

  assert!(report.is_success());
  assert_eq!(report.planned.len(), 6);
  assert_eq!(report.planned[4].to_string(), "clean:site");
  assert!(project.exists("lib/pickadate.date.js"));
  assert!(project.exists("site/index.htm"));
}

#[test]
fn reports_artifact_hashes() {
  let project = Project::picker();
  let report = project.orchestrator().run("concat:lib").unwrap();

  let artifacts: Vec<_> = report.artifacts().collect();
  assert_eq!(artifacts.len(), 2);
  assert!(artifacts[0].path.ends_with("lib/pickadate.date.js"));
  assert_eq!(artifacts[0].hash.0.len(), 64);
}

#[test]
fn rerunning_is_idempotent() {
  let project = Project::picker();
  let orchestrator = project.orchestrator();

  orchestrator.run("default").unwrap();
  let lib = hash_directory(&project.path().join("lib")).unwrap();
  let site = hash_directory(&project.path().join("site")).unwrap();

  orchestrator.run("default").unwrap();
  assert_eq!(hash_directory(&project.path().join("lib")).unwrap(), lib);
  assert_eq!(hash_directory(&project.path().join("site")).unwrap(), site);
}

#[test]
fn clean_removes_stale_outputs() {
  let project = Project::picker();
  project.write("lib/stale.js", "old");

  let report = project.orchestrator().run("build").unwrap();

  assert!(!project.exists("lib/stale.js"));
  assert!(report.completed[0].removed.iter().any(|p| p.ends_with("lib")));
}

#[test]
fn unknown_task_has_no_side_effects() {
  let project = Project::picker();
  let orchestrator = project.orchestrator();

  let err = orchestrator.run_all(&["build", "deploy"]).unwrap_err();
  assert!(matches!(err, RunError::TaskNotFound(ref name) if name == "deploy"));
  assert!(!project.exists("lib"));
  assert!(!project.exists("pickadate.jquery.json"));
}

#[test]
fn missing_target_has_no_side_effects() {
  let project = Project::picker();
  let err = project.orchestrator().run_all(&["build", "copy:docs"]).unwrap_err();

  assert!(matches!(err, RunError::TargetNotFound { .. }));
  assert!(!project.exists("lib"));
}

#[cfg(unix)]
#[test]
fn failure_stops_the_run_and_keeps_earlier_outputs() {
  let taskfile = format!(
    "{}\nplugins:\n  lint: exec\n",
    super::common::PICKER_TASKFILE.replace(
      "  watch:\n",
      "  lint:\n    options:\n      command: [sh, -c, \"echo bad style >&2; exit 3\"]\n    lib: {}\n  watch:\n"
    )
  )
  .replace(
    "build: [clean:lib, concat:lib, copy:lib, copy:pkg]",
    "build: [clean:lib, concat:lib, lint:lib, copy:lib, copy:pkg]"
  );
  let project = Project::new(&taskfile);

  let report = project.orchestrator().run("build").unwrap();

  assert_eq!(report.status(), RunState::Failed(2));
  let (step, err) = report.failed.as_ref().unwrap();
  assert_eq!(step.to_string(), "lint:lib");
  assert!(err.to_string().contains("bad style"), "unexpected error: {}", err);
  assert_eq!(report.completed.len(), 2);
  assert_eq!(report.skipped.len(), 2);

  assert_eq!(project.read("lib/pickadate.date.js"), DATE_JS);
  assert!(!project.exists("lib/translations"));
}

#[test]
fn missing_manifest_fails_to_load() {
  let project = Project::picker();
  std::fs::remove_file(project.path().join("package.json")).unwrap();

  let result = conveyor_lib::taskfile::load(&project.path().join("conveyor.yml"), None);
  assert!(result.is_err());
}
