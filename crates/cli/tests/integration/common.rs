//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated project directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create a picker project from the `picker.yml` fixture.
  pub fn picker() -> Self {
    let env = Self::empty();
    env.write_file("conveyor.yml", &fixture_content("picker.yml"));
    env.write_file("package.json", &fixture_content("package.json"));
    env.write_file("_source/lib/datepicker.js", "var datepicker = 1;");
    env.write_file("_source/lib/basepicker.js", "var basepicker = 1;");
    env
  }

  /// Create an empty project directory.
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the project directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.temp.path().join(relative_path))
      .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative_path, e))
  }

  /// A `conveyor` command running inside the project directory.
  pub fn cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("conveyor");
    cmd.current_dir(self.temp.path()).env_remove("RUST_LOG");
    cmd
  }
}
