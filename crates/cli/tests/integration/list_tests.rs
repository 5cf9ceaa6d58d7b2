//! `conveyor list`.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn list_shows_package_aliases_and_targets() {
  let env = TestEnv::picker();

  env
    .cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("pickadate.js v3.0.0"))
    .stdout(predicate::str::contains("clean:lib, concat:lib, copy:pkg"))
    .stdout(predicate::str::contains("(pkg, missing)"))
    .stdout(predicate::str::contains("Functions: ").and(predicate::str::contains("today")))
    .stdout(predicate::str::contains("Delimiters: ").and(predicate::str::contains("config")));
}

#[test]
fn list_reads_package_under_custom_key() {
  let env = TestEnv::picker();
  let taskfile = env
    .read_file("conveyor.yml")
    .replace("manifest: package.json", "manifest: { path: package.json, key: meta }")
    .replace("<%= pkg.", "<%= meta.");
  env.write_file("conveyor.yml", &taskfile);

  env
    .cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("pickadate.js v3.0.0"));
}

#[test]
fn list_json() {
  let env = TestEnv::picker();

  let output = env.cmd().args(["list", "--output", "json"]).output().unwrap();
  assert!(output.status.success());

  let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(listing["package"]["name"], "pickadate");
  let tasks = listing["tasks"].as_array().unwrap();
  let build = tasks.iter().find(|t| t["name"] == "build").unwrap();
  assert_eq!(build["kind"], "alias");
  assert!(listing["functions"].as_array().unwrap().iter().any(|f| f == "today"));
  assert!(listing["delimiters"].as_array().unwrap().iter().any(|d| d == "config"));
}
