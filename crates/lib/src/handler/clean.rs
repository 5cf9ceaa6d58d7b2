//! `clean`: delete matched files and directories.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{Handler, HandlerError, Invocation, StepOutput};

/// Deletes every matched path. Paths outside the base directory, and the base
/// directory itself, are refused unless `force: true` is set.
pub struct CleanHandler;

impl Handler for CleanHandler {
  fn run(&self, invocation: &Invocation<'_>) -> Result<StepOutput, HandlerError> {
    let force = invocation.option_bool("force")?.unwrap_or(false);
    let base = invocation
      .base_dir
      .canonicalize()
      .map_err(|e| HandlerError::io("failed to resolve", invocation.base_dir, e))?;

    let mut output = StepOutput::default();

    for rel in invocation.sources() {
      let path = invocation.path(rel);
      let Ok(metadata) = fs::symlink_metadata(&path) else {
        debug!(path = %path.display(), "already gone");
        continue;
      };

      let located = locate(&path).map_err(|e| HandlerError::io("failed to resolve", &path, e))?;
      if !force && (located == base || !located.starts_with(&base)) {
        return Err(HandlerError::option(
          "force",
          format!("refusing to delete {} outside the project", located.display()),
        ));
      }

      // Links are removed themselves, never what they point at.
      let removed = if metadata.is_dir() {
        fs::remove_dir_all(&path)
      } else {
        fs::remove_file(&path).or_else(|e| if metadata.is_symlink() { fs::remove_dir(&path) } else { Err(e) })
      };
      removed.map_err(|e| HandlerError::io("failed to remove", &path, e))?;
      info!(path = %rel.display(), "removed");
      output.removed.push(rel.clone());
    }

    Ok(output)
  }
}

/// Where `path` itself lives: its parent resolved, its last component kept.
/// A symlink is located at the link, not at its target.
fn locate(path: &Path) -> std::io::Result<PathBuf> {
  match (path.parent(), path.file_name()) {
    (Some(parent), Some(name)) => Ok(parent.canonicalize()?.join(name)),
    _ => path.canonicalize(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::context::Context;
  use crate::handler::testing::{mapping, run};
  use serde_json::json;
  use tempfile::TempDir;

  #[test]
  fn removes_directories_and_ignores_missing() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("lib/themes")).unwrap();
    fs::write(temp.path().join("lib/themes/default.css"), "a{}").unwrap();

    let output = run(
      &CleanHandler,
      &Context::default(),
      temp.path(),
      &[mapping(&["lib", "site"], None)],
      json!({}),
    )
    .unwrap();

    assert!(!temp.path().join("lib").exists());
    assert_eq!(output.removed, vec![std::path::PathBuf::from("lib")]);
  }

  #[test]
  fn refuses_base_directory() {
    let temp = TempDir::new().unwrap();
    let result = run(
      &CleanHandler,
      &Context::default(),
      temp.path(),
      &[mapping(&["."], None)],
      json!({}),
    );
    assert!(matches!(result, Err(HandlerError::InvalidOption { ref name, .. }) if name == "force"));
    assert!(temp.path().exists());
  }

  #[test]
  fn refuses_paths_outside_project() {
    let outer = TempDir::new().unwrap();
    let project = outer.path().join("project");
    fs::create_dir_all(&project).unwrap();
    fs::write(outer.path().join("keep.txt"), "keep").unwrap();

    let result = run(
      &CleanHandler,
      &Context::default(),
      &project,
      &[mapping(&["../keep.txt"], None)],
      json!({}),
    );
    assert!(result.is_err());
    assert!(outer.path().join("keep.txt").exists());
  }

  #[cfg(unix)]
  #[test]
  fn removes_symlink_not_its_target() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("_source/lib")).unwrap();
    fs::write(temp.path().join("_source/lib/datepicker.js"), "var datepicker = 1;").unwrap();
    fs::create_dir_all(temp.path().join("lib")).unwrap();
    std::os::unix::fs::symlink(temp.path().join("_source/lib"), temp.path().join("lib/current")).unwrap();

    let output = run(
      &CleanHandler,
      &Context::default(),
      temp.path(),
      &[mapping(&["lib/current"], None)],
      json!({}),
    )
    .unwrap();

    assert_eq!(output.removed, vec![std::path::PathBuf::from("lib/current")]);
    assert!(fs::symlink_metadata(temp.path().join("lib/current")).is_err());
    assert!(temp.path().join("_source/lib/datepicker.js").exists());
  }

  #[cfg(unix)]
  #[test]
  fn removes_directory_without_following_links_inside() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("_source/lib")).unwrap();
    fs::write(temp.path().join("_source/lib/basepicker.js"), "var basepicker = 1;").unwrap();
    fs::create_dir_all(temp.path().join("lib")).unwrap();
    std::os::unix::fs::symlink(temp.path().join("_source/lib"), temp.path().join("lib/src")).unwrap();

    run(
      &CleanHandler,
      &Context::default(),
      temp.path(),
      &[mapping(&["lib"], None)],
      json!({}),
    )
    .unwrap();

    assert!(!temp.path().join("lib").exists());
    assert!(temp.path().join("_source/lib/basepicker.js").exists());
  }
}
