//! Taskfile loading.
//!
//! A taskfile is a YAML document that declares the context data, the task
//! definitions and the composite tasks of a project:
//!
//! ```yaml
//! manifest: package.json
//! delimiters:
//!   curly: ["{%", "%}"]
//! plugins:
//!   sass: exec
//! config:
//!   dirs: { lib: { src: _source/lib, dest: lib } }
//!   clean: { lib: ["<%= dirs.lib.dest %>"] }
//!   sass: { ... }
//! aliases:
//!   build: [clean:lib, sass]
//! ```
//!
//! Loading produces a ready [`Orchestrator`]. Relative paths in the taskfile
//! are resolved against its directory unless another base is given.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::DEFAULT_MANIFEST_KEY;
use crate::context::Context;
use crate::handler::HandlerKind;
use crate::manifest::{ManifestError, PackageInfo, load_manifest};
use crate::orchestrator::{Orchestrator, TaskRegistration};
use crate::template::TemplateError;

/// Errors that can occur while loading a taskfile.
#[derive(Debug, Error)]
pub enum TaskfileError {
  #[error("failed to read taskfile {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse taskfile {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_yaml::Error },

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error("delimiters '{name}': {source}")]
  Delimiters { name: String, source: TemplateError },

  #[error("task '{task}' uses unknown handler '{kind}' (expected one of: clean, copy, concat, exec)")]
  UnknownHandler { task: String, kind: String },
}

/// Where the package manifest comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ManifestDecl {
  Path(PathBuf),
  Detailed {
    path: PathBuf,
    #[serde(default = "default_manifest_key")]
    key: String,
  },
}

fn default_manifest_key() -> String {
  DEFAULT_MANIFEST_KEY.to_string()
}

impl ManifestDecl {
  pub fn path(&self) -> &Path {
    match self {
      ManifestDecl::Path(path) | ManifestDecl::Detailed { path, .. } => path,
    }
  }

  pub fn key(&self) -> &str {
    match self {
      ManifestDecl::Path(_) => DEFAULT_MANIFEST_KEY,
      ManifestDecl::Detailed { key, .. } => key,
    }
  }
}

/// Parsed taskfile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Taskfile {
  #[serde(default)]
  pub manifest: Option<ManifestDecl>,

  /// Alternate delimiter pairs by name.
  #[serde(default)]
  pub delimiters: BTreeMap<String, (String, String)>,

  /// Task name to handler kind.
  #[serde(default)]
  pub plugins: BTreeMap<String, String>,

  /// Context data, including task configuration sections.
  #[serde(default)]
  pub config: Map<String, Value>,

  /// Composite tasks.
  #[serde(default)]
  pub aliases: BTreeMap<String, Vec<String>>,
}

impl Taskfile {
  pub fn parse(content: &str, path: &Path) -> Result<Self, TaskfileError> {
    serde_yaml::from_str(content).map_err(|source| TaskfileError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn from_path(path: &Path) -> Result<Self, TaskfileError> {
    let content = fs::read_to_string(path).map_err(|source| TaskfileError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content, path)
  }

  /// Build an orchestrator with everything this taskfile declares.
  ///
  /// Registration order: built-in handlers for config sections named after
  /// them, plugins, then aliases. Later registrations replace earlier ones.
  pub fn into_orchestrator(self, base_dir: &Path) -> Result<Orchestrator, TaskfileError> {
    let plugins = self
      .plugins
      .iter()
      .map(|(task, kind)| {
        HandlerKind::from_str(kind)
          .map(|kind| (task.clone(), kind))
          .map_err(|_| TaskfileError::UnknownHandler {
            task: task.clone(),
            kind: kind.clone(),
          })
      })
      .collect::<Result<Vec<_>, _>>()?;

    let mut context = Context::new(self.config);
    let mut package = None;
    if let Some(decl) = &self.manifest {
      let manifest = load_manifest(&base_dir.join(decl.path()))?;
      package = PackageInfo::from_value(&manifest)
        .inspect_err(|e| debug!(error = %e, "manifest has no package summary"))
        .ok();
      if context.insert(decl.key(), manifest).is_some() {
        debug!(key = %decl.key(), "manifest replaces config section");
      }
    }

    let mut orchestrator = Orchestrator::new(context, base_dir);
    if let Some(package) = package {
      orchestrator.set_package(package);
    }

    for (name, (open, close)) in &self.delimiters {
      orchestrator
        .add_delimiters(name.clone(), open, close)
        .map_err(|source| TaskfileError::Delimiters {
          name: name.clone(),
          source,
        })?;
    }

    for kind in [HandlerKind::Clean, HandlerKind::Copy, HandlerKind::Concat] {
      let name = kind.as_str();
      if orchestrator.context().section(name).is_some() && !self.plugins.contains_key(name) {
        orchestrator.register_task(name, TaskRegistration::Handler(kind.handler()));
      }
    }
    for (task, kind) in plugins {
      orchestrator.register_task(task, TaskRegistration::Handler(kind.handler()));
    }
    for (name, tasks) in self.aliases {
      orchestrator.register_alias(name, tasks);
    }

    Ok(orchestrator)
  }
}

/// Read the taskfile at `path` and build its orchestrator.
///
/// The base directory is `base` if given, otherwise the taskfile's directory.
pub fn load(path: &Path, base: Option<&Path>) -> Result<Orchestrator, TaskfileError> {
  let taskfile = Taskfile::from_path(path)?;
  let base_dir = match base {
    Some(base) => base.to_path_buf(),
    None => match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
      _ => PathBuf::from("."),
    },
  };
  info!(taskfile = %path.display(), base = %base_dir.display(), "loading taskfile");
  taskfile.into_orchestrator(&base_dir)
}
