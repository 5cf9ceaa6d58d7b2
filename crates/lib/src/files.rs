//! Source/destination file mappings of a task target.
//!
//! Targets describe their files in any of the shapes Gruntfiles use:
//!
//! ```yaml
//! gruntfile: Gruntfile.js                       # one pattern
//! lib: [lib/**/*.js, "!lib/**/*.min.js"]        # pattern list
//! site: { src: [a.js, b.js], dest: out.js }     # compact
//! lib:                                          # files object
//!   files: { lib/main.js: [a.js, b.js] }
//! lib:                                          # files array
//!   files:
//!     - { expand: true, cwd: src, src: ["*.js"], dest: lib/ }
//!     - { index.htm: _source/index.htm }
//! ```
//!
//! [`normalize`] turns a resolved target into [`FileSpec`]s and [`expand`]
//! matches their patterns against the filesystem.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use walkdir::WalkDir;

use crate::consts::OPTIONS_KEY;
use crate::context::value_kind;

/// Errors that can occur while normalizing or expanding file specs.
#[derive(Debug, Error)]
pub enum FilesError {
  #[error("invalid file specification: {0}")]
  InvalidSpec(String),

  #[error("failed to walk {}: {message}", path.display())]
  Walk { path: PathBuf, message: String },
}

/// One file specification before globbing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSpec {
  pub src: Vec<String>,
  pub dest: Option<String>,
  /// Produce one mapping per matched file.
  pub expand: bool,
  /// Directory `src` patterns are relative to (expand mode).
  pub cwd: Option<String>,
  /// Replacement extension for expanded destinations, e.g. `.min.css`.
  pub ext: Option<String>,
  /// Drop the directory part of expanded destinations.
  pub flatten: bool,
}

/// Sources and destination after globbing. Paths are relative to the base
/// directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileMapping {
  pub src: Vec<PathBuf>,
  pub dest: Option<PathBuf>,
  /// Literal patterns that matched nothing.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub missing: Vec<String>,
}

impl FileMapping {
  /// Whether the destination names a directory (`lib/`).
  pub fn dest_is_dir(&self) -> bool {
    self
      .dest
      .as_ref()
      .is_some_and(|dest| dest.as_os_str().to_string_lossy().ends_with(['/', '\\']))
  }
}

/// Turn a resolved target value into file specs.
///
/// The `options` key and keys that are not file related (such as `tasks` in a
/// watch target) are ignored.
pub fn normalize(target: &Value) -> Result<Vec<FileSpec>, FilesError> {
  match target {
    Value::String(_) | Value::Array(_) => Ok(vec![FileSpec {
      src: string_list(target, "src")?,
      ..Default::default()
    }]),
    Value::Object(map) => {
      if let Some(files) = map.get("files") {
        return normalize_files(files);
      }
      if map.contains_key("src") {
        return Ok(vec![compact(map)?]);
      }
      Ok(Vec::new())
    }
    Value::Null => Ok(Vec::new()),
    other => Err(FilesError::InvalidSpec(format!(
      "expected a pattern, list or mapping, found {}",
      value_kind(other)
    ))),
  }
}

fn normalize_files(files: &Value) -> Result<Vec<FileSpec>, FilesError> {
  match files {
    Value::Object(map) => dest_src_pairs(map),
    Value::Array(items) => {
      if items.iter().all(Value::is_string) {
        return Ok(vec![FileSpec {
          src: string_list(files, "files")?,
          ..Default::default()
        }]);
      }
      let mut specs = Vec::new();
      for item in items {
        match item {
          Value::Object(map) if map.contains_key("src") => specs.push(compact(map)?),
          Value::Object(map) => specs.extend(dest_src_pairs(map)?),
          other => {
            return Err(FilesError::InvalidSpec(format!(
              "entries of 'files' must be mappings, found {}",
              value_kind(other)
            )));
          }
        }
      }
      Ok(specs)
    }
    other => Err(FilesError::InvalidSpec(format!(
      "'files' must be a mapping or list, found {}",
      value_kind(other)
    ))),
  }
}

fn dest_src_pairs(map: &Map<String, Value>) -> Result<Vec<FileSpec>, FilesError> {
  map
    .iter()
    .filter(|(key, _)| key.as_str() != OPTIONS_KEY)
    .map(|(dest, src)| {
      Ok(FileSpec {
        src: string_list(src, dest)?,
        dest: Some(dest.clone()),
        ..Default::default()
      })
    })
    .collect()
}

fn compact(map: &Map<String, Value>) -> Result<FileSpec, FilesError> {
  let src = map.get("src").map(|v| string_list(v, "src")).transpose()?.unwrap_or_default();
  Ok(FileSpec {
    src,
    dest: optional_string(map, "dest")?,
    expand: optional_bool(map, "expand")?,
    cwd: optional_string(map, "cwd")?,
    ext: optional_string(map, "ext")?,
    flatten: optional_bool(map, "flatten")?,
  })
}

fn string_list(value: &Value, what: &str) -> Result<Vec<String>, FilesError> {
  match value {
    Value::String(s) => Ok(vec![s.clone()]),
    Value::Array(items) => {
      let mut out = Vec::with_capacity(items.len());
      for item in items {
        out.extend(string_list(item, what)?);
      }
      Ok(out)
    }
    other => Err(FilesError::InvalidSpec(format!(
      "'{what}' must be a pattern or list of patterns, found {}",
      value_kind(other)
    ))),
  }
}

fn optional_string(map: &Map<String, Value>, key: &str) -> Result<Option<String>, FilesError> {
  match map.get(key) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => Ok(Some(s.clone())),
    Some(other) => Err(FilesError::InvalidSpec(format!(
      "'{key}' must be a string, found {}",
      value_kind(other)
    ))),
  }
}

fn optional_bool(map: &Map<String, Value>, key: &str) -> Result<bool, FilesError> {
  match map.get(key) {
    None | Some(Value::Null) => Ok(false),
    Some(Value::Bool(b)) => Ok(*b),
    Some(other) => Err(FilesError::InvalidSpec(format!(
      "'{key}' must be true or false, found {}",
      value_kind(other)
    ))),
  }
}

/// Result of matching a pattern list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
  /// Matched paths relative to the directory the patterns were matched in.
  pub paths: Vec<PathBuf>,
  /// Literal patterns that matched nothing.
  pub missing: Vec<String>,
}

/// Expand specs into mappings relative to `base`.
pub fn expand(specs: &[FileSpec], base: &Path) -> Result<Vec<FileMapping>, FilesError> {
  let mut mappings = Vec::new();

  for spec in specs {
    if !spec.expand {
      let matches = match_patterns(&spec.src, base)?;
      mappings.push(FileMapping {
        src: matches.paths,
        dest: spec.dest.as_ref().map(PathBuf::from),
        missing: matches.missing,
      });
      continue;
    }

    let cwd = spec.cwd.as_deref().map(clean_path).unwrap_or_default();
    let matches = match_patterns(&spec.src, &base.join(&cwd))?;
    let dest_dir = spec.dest.as_deref().map(PathBuf::from).unwrap_or_default();

    for rel in matches.paths {
      let mut dest = if spec.flatten {
        PathBuf::from(rel.file_name().unwrap_or(rel.as_os_str()))
      } else {
        rel.clone()
      };
      if let Some(ext) = &spec.ext {
        dest = replace_extension(&dest, ext);
      }
      mappings.push(FileMapping {
        src: vec![cwd.join(&rel)],
        dest: Some(dest_dir.join(dest)),
        missing: Vec::new(),
      });
    }
    if !matches.missing.is_empty() {
      mappings.push(FileMapping {
        src: Vec::new(),
        dest: None,
        missing: matches.missing,
      });
    }
  }

  Ok(mappings)
}

/// Match patterns in order against `cwd`.
///
/// A pattern starting with `!` removes earlier matches. Matches of a single
/// glob are sorted; the combined list keeps first occurrences.
pub fn match_patterns(patterns: &[String], cwd: &Path) -> Result<Matches, FilesError> {
  let mut result = Matches::default();
  let mut seen = HashSet::new();

  for raw in patterns {
    if let Some(negated) = raw.strip_prefix('!') {
      let pattern = clean_pattern(negated);
      result.paths.retain(|path| {
        let keep = !glob_match::glob_match(&pattern, &slash_path(path));
        if !keep {
          seen.remove(path);
        }
        keep
      });
      continue;
    }

    let pattern = clean_pattern(raw);
    if !is_glob(&pattern) {
      let path = PathBuf::from(&pattern);
      if cwd.join(&path).exists() {
        if seen.insert(path.clone()) {
          result.paths.push(path);
        }
      } else {
        result.missing.push(raw.clone());
      }
      continue;
    }

    for path in glob(&pattern, cwd)? {
      if seen.insert(path.clone()) {
        result.paths.push(path);
      }
    }
  }

  Ok(result)
}

/// Whether a pattern contains glob metacharacters.
pub fn is_glob(pattern: &str) -> bool {
  pattern.contains(['*', '?', '[', '{'])
}

/// Match a single glob below `cwd`, sorted.
fn glob(pattern: &str, cwd: &Path) -> Result<Vec<PathBuf>, FilesError> {
  let prefix: PathBuf = pattern.split('/').take_while(|part| !is_glob(part)).collect();
  let root = cwd.join(&prefix);
  if !root.is_dir() {
    return Ok(Vec::new());
  }

  let mut paths = Vec::new();
  for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
    let entry = entry.map_err(|e| FilesError::Walk {
      path: root.clone(),
      message: e.to_string(),
    })?;
    let Ok(rel) = entry.path().strip_prefix(cwd) else {
      continue;
    };
    if glob_match::glob_match(pattern, &slash_path(rel)) {
      paths.push(rel.to_path_buf());
    }
  }
  paths.sort();
  Ok(paths)
}

/// Replace everything after the first dot of the file name with `ext`.
fn replace_extension(path: &Path, ext: &str) -> PathBuf {
  let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
  let stem = match name.split_once('.') {
    Some((stem, _)) => stem,
    None => name.as_str(),
  };
  path.with_file_name(format!("{stem}{ext}"))
}

/// Path with forward slashes, as patterns are written.
pub fn slash_path(path: &Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}

/// Lexically drop `.` and resolve `..` in a pattern's literal components.
pub(crate) fn clean_pattern(pattern: &str) -> String {
  let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
  let mut parts: Vec<&str> = Vec::new();
  for part in pattern.split('/') {
    match part {
      "." | "" => {}
      ".." if parts.last().is_some_and(|last| *last != ".." && !is_glob(last)) => {
        parts.pop();
      }
      _ => parts.push(part),
    }
  }
  let joined = parts.join("/");
  if pattern.starts_with('/') {
    format!("/{joined}")
  } else {
    joined
  }
}

fn clean_path(path: &str) -> PathBuf {
  Path::new(&clean_pattern(path))
    .components()
    .filter(|c| !matches!(c, Component::CurDir))
    .collect()
}
