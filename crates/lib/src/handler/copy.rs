//! `copy`: copy files, optionally rendering them as templates.
//!
//! ```yaml
//! copy:
//!   site:
//!     options:
//!       process:
//!         delimiters: curly
//!         exclude: ["**/*.{png,ico}"]
//!     files:
//!       - { expand: true, cwd: "<%= dirs.site.src %>/", src: ["images/*.{png,ico}"], dest: "<%= dirs.site.dest %>/" }
//!       - { index.htm: _source/index.htm }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use super::{Handler, HandlerError, Invocation, StepOutput, ensure_parent};
use crate::consts::CONFIG_DELIMITERS;
use crate::files::slash_path;

/// How file content is processed while copying.
struct Process {
  delimiters: String,
  exclude: Vec<String>,
}

impl Process {
  fn from_option(value: Option<&Value>) -> Result<Option<Self>, HandlerError> {
    match value {
      None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
      Some(Value::Bool(true)) => Ok(Some(Self {
        delimiters: CONFIG_DELIMITERS.to_string(),
        exclude: Vec::new(),
      })),
      Some(Value::Object(map)) => {
        let delimiters = match map.get("delimiters") {
          None => CONFIG_DELIMITERS.to_string(),
          Some(Value::String(name)) => name.clone(),
          Some(_) => return Err(HandlerError::option("process.delimiters", "expected a delimiter set name")),
        };
        let exclude = match map.get("exclude") {
          None => Vec::new(),
          Some(Value::String(pattern)) => vec![pattern.clone()],
          Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
              item
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| HandlerError::option("process.exclude", "expected glob patterns"))
            })
            .collect::<Result<_, _>>()?,
          Some(_) => return Err(HandlerError::option("process.exclude", "expected glob patterns")),
        };
        Ok(Some(Self { delimiters, exclude }))
      }
      Some(_) => Err(HandlerError::option("process", "expected true, false or a mapping")),
    }
  }

  fn applies_to(&self, src: &Path) -> bool {
    let src = slash_path(src);
    !self.exclude.iter().any(|pattern| glob_match::glob_match(pattern, &src))
  }
}

pub struct CopyHandler;

impl Handler for CopyHandler {
  fn run(&self, invocation: &Invocation<'_>) -> Result<StepOutput, HandlerError> {
    invocation.require_sources()?;
    let process = Process::from_option(invocation.option("process"))?;
    let mut output = StepOutput::default();
    let mut targets = BTreeSet::new();

    for mapping in invocation.files {
      let Some(dest) = &mapping.dest else {
        if mapping.src.is_empty() {
          continue;
        }
        return Err(HandlerError::option("dest", "copy needs a destination for every mapping"));
      };
      let into_dir = mapping.dest_is_dir() || mapping.src.len() > 1;

      for src in &mapping.src {
        let from = invocation.path(src);
        let rel_dest = if into_dir { nested(dest, src) } else { dest.clone() };
        if !targets.insert(rel_dest.clone()) {
          return Err(HandlerError::option(
            "dest",
            format!("{} would be written by more than one source", rel_dest.display()),
          ));
        }
        let to = invocation.path(&rel_dest);

        if from.is_dir() {
          fs::create_dir_all(&to).map_err(|e| HandlerError::io("failed to create directory", &to, e))?;
          continue;
        }

        ensure_parent(&to)?;
        match &process {
          Some(process) if process.applies_to(src) => copy_processed(invocation, &from, &to, &process.delimiters)?,
          _ => {
            fs::copy(&from, &to).map_err(|e| HandlerError::io("failed to copy", &from, e))?;
          }
        }
        debug!(from = %src.display(), to = %rel_dest.display(), "copied");
        output.written.push(rel_dest);
      }
    }

    info!(files = output.written.len(), "copied files");
    Ok(output)
  }
}

/// `dest` joined with the source's own relative path, so `src/a/x.js` into
/// `out/` lands at `out/src/a/x.js`.
fn nested(dest: &Path, src: &Path) -> PathBuf {
  src
    .components()
    .filter_map(|component| match component {
      Component::Normal(part) => Some(part),
      _ => None,
    })
    .fold(dest.to_path_buf(), |path, part| path.join(part))
}

fn copy_processed(invocation: &Invocation<'_>, from: &PathBuf, to: &PathBuf, delimiters: &str) -> Result<(), HandlerError> {
  let content = fs::read_to_string(from).map_err(|e| HandlerError::io("failed to read", from, e))?;
  let rendered = invocation.process_template(&content, delimiters)?;
  fs::write(to, rendered).map_err(|e| HandlerError::io("failed to write", to, e))
}
