//! `conveyor resolve`.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn resolve_interpolates_context() {
  let env = TestEnv::picker();

  env
    .cmd()
    .args(["resolve", "<%= dirs.lib.dest %>/<%= pkg.name %>.js"])
    .assert()
    .success()
    .stdout("lib/pickadate.js\n");
}

#[test]
fn resolve_nested_placeholders() {
  let env = TestEnv::picker();

  env
    .cmd()
    .args(["resolve", "<%= banner.js %>"])
    .assert()
    .success()
    .stdout(predicate::str::starts_with("/*! pickadate.js v3.0.0 | MIT */"));
}

#[test]
fn resolve_missing_path_fails() {
  let env = TestEnv::picker();

  env
    .cmd()
    .args(["resolve", "<%= dirs.docs.dest %>"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to resolve"));
}

#[test]
fn resolve_unknown_delimiters_fails() {
  let env = TestEnv::picker();

  env
    .cmd()
    .args(["resolve", "-d", "curly", "{%= pkg.name %}"])
    .assert()
    .failure();
}
