//! Package manifest loading.
//!
//! The package manifest (`package.json`) supplies project metadata to the
//! context, typically under `pkg`. Banners read `pkg.title`, `pkg.version`,
//! `pkg.author.name`, `pkg.author.url`, `pkg.homepage` and
//! `pkg.licenses[0].type`; output names read `pkg.name`.
//!
//! A manifest that is missing or malformed is fatal: nothing can run without
//! it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::context::value_kind;

/// Errors that can occur while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read manifest {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse manifest {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_json::Error },

  #[error("manifest {} must be a JSON object, found {kind}", path.display())]
  NotAnObject { path: PathBuf, kind: &'static str },

  #[error("manifest field '{field}' is missing or not a string")]
  MissingField { field: &'static str },
}

/// Read and parse a JSON manifest.
pub fn load_manifest(path: &Path) -> Result<Value, ManifestError> {
  let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  let value: Value = serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
    path: path.to_path_buf(),
    source,
  })?;

  if !value.is_object() {
    return Err(ManifestError::NotAnObject {
      path: path.to_path_buf(),
      kind: value_kind(&value),
    });
  }

  debug!(path = %path.display(), "loaded manifest");
  Ok(value)
}

/// Identifying fields of a package, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
  pub name: String,
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
}

impl PackageInfo {
  /// Extract the identifying fields from a loaded manifest.
  pub fn from_value(manifest: &Value) -> Result<Self, ManifestError> {
    let field = |name: &'static str| {
      manifest
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ManifestError::MissingField { field: name })
    };

    Ok(Self {
      name: field("name")?,
      version: field("version")?,
      title: manifest.get("title").and_then(Value::as_str).map(str::to_string),
    })
  }

  /// Title when present, otherwise the package name.
  pub fn display_name(&self) -> &str {
    self.title.as_deref().unwrap_or(&self.name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use tempfile::TempDir;

  fn write(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("package.json");
    fs::write(&path, content).unwrap();
    path
  }

  #[test]
  fn loads_object_manifest() {
    let temp = TempDir::new().unwrap();
    let path = write(
      &temp,
      r#"{ "name": "pickadate", "version": "3.0.0", "licenses": [{ "type": "MIT" }] }"#,
    );

    let manifest = load_manifest(&path).unwrap();
    assert_eq!(manifest["licenses"][0]["type"], json!("MIT"));

    let info = PackageInfo::from_value(&manifest).unwrap();
    assert_eq!(info.name, "pickadate");
    assert_eq!(info.display_name(), "pickadate");
  }

  #[test]
  fn missing_file_is_read_error() {
    let temp = TempDir::new().unwrap();
    let result = load_manifest(&temp.path().join("package.json"));
    assert!(matches!(result, Err(ManifestError::Read { .. })));
  }

  #[test]
  fn malformed_json_is_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "{ name: pickadate");
    assert!(matches!(load_manifest(&path), Err(ManifestError::Parse { .. })));
  }

  #[test]
  fn array_manifest_rejected() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "[1, 2]");
    assert!(matches!(
      load_manifest(&path),
      Err(ManifestError::NotAnObject { kind: "a list", .. })
    ));
  }

  #[test]
  fn package_info_requires_version() {
    let result = PackageInfo::from_value(&json!({ "name": "pickadate" }));
    assert!(matches!(result, Err(ManifestError::MissingField { field: "version" })));
  }
}
