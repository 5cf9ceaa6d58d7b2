//! Task handlers.
//!
//! A handler does the work of one task target. The orchestrator resolves the
//! target's files and options first and hands them over in an [`Invocation`].
//!
//! Built-in kinds:
//! - `clean`: delete matched paths
//! - `copy`: copy files, optionally template-processing their content
//! - `concat`: join sources with a banner and footer
//! - `exec`: run an external program per mapping (compilers, linters,
//!   minifiers, test runners)

mod clean;
mod concat;
mod copy;
mod exec;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::context::Scope;
use crate::files::FileMapping;
use crate::orchestrator::Step;
use crate::template::{self, DelimiterSet, TemplateError};

pub use clean::CleanHandler;
pub use concat::ConcatHandler;
pub use copy::CopyHandler;
pub use exec::ExecHandler;

/// Errors a handler can report.
#[derive(Debug, Error)]
pub enum HandlerError {
  #[error("{action} {}: {source}", path.display())]
  Io {
    action: &'static str,
    path: PathBuf,
    source: std::io::Error,
  },

  #[error("source file not found: {0}")]
  MissingSource(String),

  #[error("invalid option '{name}': {message}")]
  InvalidOption { name: String, message: String },

  #[error("failed to start {program}: {source}")]
  Spawn { program: String, source: std::io::Error },

  #[error("command failed with exit code {code:?}: {cmd}{}", format_output(.output))]
  CommandFailed {
    cmd: String,
    code: Option<i32>,
    output: String,
  },

  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error("{0}")]
  Failed(String),
}

fn format_output(output: &str) -> String {
  if output.is_empty() {
    String::new()
  } else {
    format!("\n{output}")
  }
}

impl HandlerError {
  pub(crate) fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
    Self::Io {
      action,
      path: path.to_path_buf(),
      source,
    }
  }

  pub(crate) fn option(name: &str, message: impl Into<String>) -> Self {
    Self::InvalidOption {
      name: name.to_string(),
      message: message.into(),
    }
  }
}

/// What a handler did, relative to the base directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
  pub written: Vec<PathBuf>,
  pub removed: Vec<PathBuf>,
}

/// Everything a handler gets to see about the step it runs.
pub struct Invocation<'a> {
  pub step: &'a Step,
  pub files: &'a [FileMapping],
  pub options: &'a Map<String, Value>,
  pub base_dir: &'a Path,
  pub(crate) scope: &'a Scope<'a>,
  pub(crate) delimiters: &'a DelimiterSet,
}

impl<'a> Invocation<'a> {
  /// Absolute path of a base-relative path.
  pub fn path(&self, rel: &Path) -> PathBuf {
    self.base_dir.join(rel)
  }

  /// Source paths of all mappings, in order.
  pub fn sources(&self) -> impl Iterator<Item = &'a PathBuf> {
    self.files.iter().flat_map(|mapping| mapping.src.iter())
  }

  /// Fail if any literal source pattern matched nothing.
  pub fn require_sources(&self) -> Result<(), HandlerError> {
    match self.files.iter().flat_map(|m| m.missing.iter()).next() {
      Some(missing) => Err(HandlerError::MissingSource(missing.clone())),
      None => Ok(()),
    }
  }

  pub fn option(&self, name: &str) -> Option<&'a Value> {
    self.options.get(name)
  }

  pub fn option_str(&self, name: &str) -> Result<Option<&'a str>, HandlerError> {
    match self.options.get(name) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::String(s)) => Ok(Some(s)),
      Some(_) => Err(HandlerError::option(name, "expected a string")),
    }
  }

  pub fn option_bool(&self, name: &str) -> Result<Option<bool>, HandlerError> {
    match self.options.get(name) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::Bool(b)) => Ok(Some(*b)),
      Some(_) => Err(HandlerError::option(name, "expected true or false")),
    }
  }

  pub fn option_list(&self, name: &str) -> Result<Option<Vec<String>>, HandlerError> {
    match self.options.get(name) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::String(s)) => Ok(Some(vec![s.clone()])),
      Some(Value::Array(items)) => items
        .iter()
        .map(|item| match item {
          Value::String(s) => Ok(s.clone()),
          Value::Number(n) => Ok(n.to_string()),
          _ => Err(HandlerError::option(name, "expected a list of strings")),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some),
      Some(_) => Err(HandlerError::option(name, "expected a list of strings")),
    }
  }

  /// Render `content` against the context with a named delimiter set.
  pub fn process_template(&self, content: &str, delimiters: &str) -> Result<String, HandlerError> {
    let delimiters = self.delimiters.get(delimiters)?;
    Ok(template::process(content, delimiters, self.scope)?)
  }
}

/// Work performed for one task target.
pub trait Handler {
  fn run(&self, invocation: &Invocation<'_>) -> Result<StepOutput, HandlerError>;
}

impl<F> Handler for F
where
  F: Fn(&Invocation<'_>) -> Result<StepOutput, HandlerError>,
{
  fn run(&self, invocation: &Invocation<'_>) -> Result<StepOutput, HandlerError> {
    self(invocation)
  }
}

/// Built-in handler kinds a taskfile can bind task names to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
  Clean,
  Copy,
  Concat,
  Exec,
}

impl HandlerKind {
  pub const ALL: [HandlerKind; 4] = [HandlerKind::Clean, HandlerKind::Copy, HandlerKind::Concat, HandlerKind::Exec];

  pub fn as_str(&self) -> &'static str {
    match self {
      HandlerKind::Clean => "clean",
      HandlerKind::Copy => "copy",
      HandlerKind::Concat => "concat",
      HandlerKind::Exec => "exec",
    }
  }

  pub fn handler(&self) -> Box<dyn Handler> {
    match self {
      HandlerKind::Clean => Box::new(CleanHandler),
      HandlerKind::Copy => Box::new(CopyHandler),
      HandlerKind::Concat => Box::new(ConcatHandler),
      HandlerKind::Exec => Box::new(ExecHandler),
    }
  }
}

impl fmt::Display for HandlerKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for HandlerKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    HandlerKind::ALL
      .into_iter()
      .find(|kind| kind.as_str() == s)
      .ok_or_else(|| format!("unknown handler kind '{s}'"))
  }
}

/// Create parent directories of `path`.
pub(crate) fn ensure_parent(path: &Path) -> Result<(), HandlerError> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent).map_err(|e| HandlerError::io("failed to create directory", parent, e))?;
  }
  Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
  //! Helpers for running handlers outside an orchestrator.

  use super::*;
  use crate::context::Context;

  pub fn step(task: &str, target: &str) -> Step {
    Step {
      task: task.to_string(),
      target: target.to_string(),
      args: Vec::new(),
    }
  }

  /// Run `handler` with the given mappings and options against `context`.
  pub fn run(
    handler: &dyn Handler,
    context: &Context,
    base_dir: &Path,
    files: &[FileMapping],
    options: Value,
  ) -> Result<StepOutput, HandlerError> {
    let mut delimiters = DelimiterSet::default();
    delimiters.insert("curly", template::Delimiters::new("{%", "%}").unwrap());
    let options = match options {
      Value::Object(map) => map,
      _ => Map::new(),
    };
    let step = step("test", "target");
    let scope = context.scope();
    let invocation = Invocation {
      step: &step,
      files,
      options: &options,
      base_dir,
      scope: &scope,
      delimiters: &delimiters,
    };
    handler.run(&invocation)
  }

  pub fn mapping(src: &[&str], dest: Option<&str>) -> FileMapping {
    FileMapping {
      src: src.iter().map(PathBuf::from).collect(),
      dest: dest.map(PathBuf::from),
      missing: Vec::new(),
    }
  }
}
