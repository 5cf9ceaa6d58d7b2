//! Scaffold a starter taskfile.
//!
//! `conveyor init [DIR]` writes a `conveyor.yml` describing the picker
//! project layout: `_source/lib` and `_source/site` built into `lib/` and
//! `site/`, with external tools wired up through `exec`.

mod templates;

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::consts::DEFAULT_TASKFILE;

pub use templates::TASKFILE_TEMPLATE;

/// Errors that can occur during initialization.
#[derive(Debug, Error)]
pub enum InitError {
  #[error("file already exists: {}", path.display())]
  PathExists { path: PathBuf },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },
}

/// Result of a successful initialization.
#[derive(Debug)]
pub struct InitResult {
  /// The project directory.
  pub dir: PathBuf,
  /// Path to the created taskfile.
  pub taskfile: PathBuf,
}

/// Write a starter taskfile into `dir`, creating the directory if needed.
///
/// # Errors
///
/// Returns an error if a taskfile already exists or writing fails.
pub fn init(dir: impl Into<PathBuf>) -> Result<InitResult, InitError> {
  let dir = dir.into();
  fs::create_dir_all(&dir).map_err(|source| InitError::CreateDir {
    path: dir.clone(),
    source,
  })?;

  let taskfile = dir.join(DEFAULT_TASKFILE);
  if taskfile.exists() {
    return Err(InitError::PathExists { path: taskfile });
  }

  fs::write(&taskfile, TASKFILE_TEMPLATE).map_err(|source| InitError::WriteFile {
    path: taskfile.clone(),
    source,
  })?;
  info!(path = %taskfile.display(), "created taskfile");

  Ok(InitResult { dir, taskfile })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::taskfile::load;
  use tempfile::TempDir;

  #[test]
  fn init_creates_taskfile() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("nested").join("picker");

    let result = init(&dir).unwrap();

    assert_eq!(result.taskfile, dir.join("conveyor.yml"));
    assert_eq!(fs::read_to_string(&result.taskfile).unwrap(), TASKFILE_TEMPLATE);
  }

  #[test]
  fn init_fails_if_taskfile_exists() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("conveyor.yml"), "config: {}\n").unwrap();

    let err = init(temp.path()).unwrap_err();
    assert!(matches!(err, InitError::PathExists { .. }));
    assert!(err.to_string().contains("conveyor.yml"));
    assert_eq!(fs::read_to_string(temp.path().join("conveyor.yml")).unwrap(), "config: {}\n");
  }

  #[test]
  fn starter_taskfile_plans_every_alias() {
    let temp = TempDir::new().unwrap();
    let result = init(temp.path()).unwrap();
    fs::write(
      temp.path().join("package.json"),
      r#"{ "name": "pickadate", "title": "pickadate.js", "version": "3.0.0" }"#,
    )
    .unwrap();

    let orchestrator = load(&result.taskfile, None).unwrap();
    let build = orchestrator.plan(&["build"]).unwrap();
    assert_eq!(build.first().map(ToString::to_string), Some("clean:lib".to_string()));
    assert_eq!(build.len(), 8);

    let site: Vec<String> = orchestrator.plan(&["site"]).unwrap().iter().map(ToString::to_string).collect();
    assert_eq!(site, vec!["jshint:site", "concat:site", "copy:site", "sass:site"]);

    for alias in ["default", "travis"] {
      assert!(!orchestrator.plan(&[alias]).unwrap().is_empty(), "{alias} should plan");
    }
    assert_eq!(orchestrator.resolve_str("{%= pkg.title %}", "curly").unwrap(), "pickadate.js");
  }
}
