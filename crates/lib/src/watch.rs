//! Re-run tasks when source files change.
//!
//! Watch targets live in the `watch` config section:
//!
//! ```yaml
//! watch:
//!   options: { debounce: 250 }
//!   lib:
//!     files: ["<%= dirs.lib.src %>/**/*.js"]
//!     tasks: [jshint:lib, concat:lib]
//! ```
//!
//! Runs are synchronous on the watching thread. Changes that happen while a
//! run is in progress queue up in the event channel; once the run finishes,
//! every queued change is drained and each affected target runs once, in
//! config order.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, DebouncedEvent, new_debouncer};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consts::{DEFAULT_WATCH_DEBOUNCE_MS, OPTIONS_KEY, WATCH_SECTION};
use crate::context::value_kind;
use crate::files::{self, FilesError, clean_pattern, slash_path};
use crate::orchestrator::{Orchestrator, RunError, RunReport};
use crate::template::TemplateError;

/// Errors that can occur while setting up or running watch mode.
#[derive(Debug, Error)]
pub enum WatchError {
  #[error("no watch targets configured")]
  NoTargets,

  #[error("watch target not found: '{0}'")]
  UnknownTarget(String),

  #[error("invalid watch configuration: {0}")]
  Invalid(String),

  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error(transparent)]
  Files(#[from] FilesError),

  #[error(transparent)]
  Run(#[from] RunError),

  #[error("failed to resolve {}: {source}", path.display())]
  Base { path: PathBuf, source: std::io::Error },

  #[error("file watcher error: {0}")]
  Notify(#[from] notify::Error),
}

/// A set of patterns and the tasks to run when a matching file changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
  pub name: String,
  pub patterns: Vec<String>,
  pub tasks: Vec<String>,
}

impl WatchTarget {
  /// Whether a change to `rel` (relative to the base directory) affects this
  /// target. Patterns apply in order; `!` patterns exclude.
  pub fn matches(&self, rel: &Path) -> bool {
    let rel = slash_path(rel);
    let mut matched = false;
    for pattern in &self.patterns {
      match pattern.strip_prefix('!') {
        Some(negated) => {
          if matched && glob_match::glob_match(negated, &rel) {
            matched = false;
          }
        }
        None => {
          if !matched && glob_match::glob_match(pattern, &rel) {
            matched = true;
          }
        }
      }
    }
    matched
  }
}

/// Resolved watch section.
#[derive(Debug, Clone)]
pub struct WatchConfig {
  pub targets: Vec<WatchTarget>,
  pub debounce: Duration,
}

impl WatchConfig {
  /// Read the watch section of the orchestrator's context. With `only`
  /// non-empty, just those targets are kept. Every target's tasks must plan.
  pub fn from_orchestrator<S: AsRef<str>>(orchestrator: &Orchestrator, only: &[S]) -> Result<Self, WatchError> {
    let section = match orchestrator.context().section(WATCH_SECTION) {
      Some(section) => orchestrator.resolve(section)?,
      None => return Err(WatchError::NoTargets),
    };
    let Value::Object(section) = section else {
      return Err(WatchError::Invalid(format!(
        "'{WATCH_SECTION}' must be a mapping, found {}",
        value_kind(&section)
      )));
    };

    let debounce = match section.get(OPTIONS_KEY).and_then(|options| options.get("debounce")) {
      None => DEFAULT_WATCH_DEBOUNCE_MS,
      Some(value) => value
        .as_u64()
        .ok_or_else(|| WatchError::Invalid("debounce must be a number of milliseconds".to_string()))?,
    };

    let mut targets = Vec::new();
    for (name, target) in section.iter().filter(|(name, _)| *name != OPTIONS_KEY) {
      if !only.is_empty() && !only.iter().any(|wanted| wanted.as_ref() == name) {
        continue;
      }
      let patterns = files::normalize(target)?
        .into_iter()
        .flat_map(|spec| spec.src)
        .map(|pattern| match pattern.strip_prefix('!') {
          Some(negated) => format!("!{}", clean_pattern(negated)),
          None => clean_pattern(&pattern),
        })
        .collect();
      let tasks = match target.get("tasks") {
        Some(Value::String(task)) => vec![task.clone()],
        Some(Value::Array(items)) => items
          .iter()
          .map(|item| {
            item
              .as_str()
              .map(str::to_string)
              .ok_or_else(|| WatchError::Invalid(format!("{name}: tasks must be strings")))
          })
          .collect::<Result<_, _>>()?,
        _ => return Err(WatchError::Invalid(format!("{name}: missing tasks"))),
      };
      orchestrator.plan(&tasks)?;
      targets.push(WatchTarget {
        name: name.clone(),
        patterns,
        tasks,
      });
    }

    if let Some(missing) = only
      .iter()
      .find(|wanted| !targets.iter().any(|target| target.name == wanted.as_ref()))
    {
      return Err(WatchError::UnknownTarget(missing.as_ref().to_string()));
    }
    if targets.is_empty() {
      return Err(WatchError::NoTargets);
    }

    Ok(Self {
      targets,
      debounce: Duration::from_millis(debounce),
    })
  }

  /// Targets affected by any of the changed paths, each once, in config
  /// order.
  pub fn affected(&self, changed: &[PathBuf]) -> Vec<&WatchTarget> {
    self
      .targets
      .iter()
      .filter(|target| changed.iter().any(|path| target.matches(path)))
      .collect()
  }
}

/// Watch the base directory and run affected targets. `on_run` receives
/// every run's outcome and decides whether watching goes on; a failed run
/// does not end watching by itself.
pub fn watch<F>(orchestrator: &Orchestrator, config: &WatchConfig, on_run: F) -> Result<(), WatchError>
where
  F: FnMut(&WatchTarget, Result<RunReport, RunError>) -> ControlFlow<()>,
{
  let base = orchestrator
    .base_dir()
    .canonicalize()
    .map_err(|source| WatchError::Base {
      path: orchestrator.base_dir().to_path_buf(),
      source,
    })?;

  let (tx, rx) = mpsc::channel();
  let mut debouncer = new_debouncer(config.debounce, tx)?;
  debouncer.watcher().watch(&base, RecursiveMode::Recursive)?;
  info!(
    base = %base.display(),
    targets = config.targets.len(),
    debounce_ms = config.debounce.as_millis() as u64,
    "watching for changes"
  );

  serve(orchestrator, config, &base, &rx, on_run);

  info!("watcher stopped");
  Ok(())
}

/// Run affected targets for each batch of events until the channel closes
/// or `on_run` breaks.
fn serve<F>(
  orchestrator: &Orchestrator,
  config: &WatchConfig,
  base: &Path,
  events: &Receiver<DebounceEventResult>,
  mut on_run: F,
) where
  F: FnMut(&WatchTarget, Result<RunReport, RunError>) -> ControlFlow<()>,
{
  loop {
    let mut changed = match events.recv() {
      Ok(Ok(batch)) => relative_paths(base, batch),
      Ok(Err(error)) => {
        warn!(error = %error, "watch error");
        continue;
      }
      Err(_) => return,
    };

    // Changes made during the previous run are still queued.
    while let Ok(queued) = events.try_recv() {
      match queued {
        Ok(batch) => changed.extend(relative_paths(base, batch)),
        Err(error) => warn!(error = %error, "watch error"),
      }
    }
    changed.sort();
    changed.dedup();
    debug!(changed = ?changed, "changes detected");

    for target in config.affected(&changed) {
      info!(target = %target.name, "running watch target");
      if on_run(target, orchestrator.run_all(&target.tasks)).is_break() {
        return;
      }
    }
  }
}

fn relative_paths(base: &Path, events: Vec<DebouncedEvent>) -> Vec<PathBuf> {
  events
    .into_iter()
    .filter_map(|event| match event.path.strip_prefix(base) {
      Ok(rel) => Some(rel.to_path_buf()),
      Err(_) => {
        debug!(path = %event.path.display(), "change outside base directory");
        None
      }
    })
    .collect()
}
