//! Types for planning and running tasks.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::files::FilesError;
use crate::handler::HandlerError;
use crate::template::TemplateError;
use crate::util::hash::ContentHash;

/// A task identifier as written in aliases and on the command line:
/// `name[:target[:arg...]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskId {
  pub name: String,
  pub target: Option<String>,
  pub args: Vec<String>,
}

impl TaskId {
  pub fn parse(input: &str) -> Result<Self, RunError> {
    let mut parts = input.split(':');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
      return Err(RunError::InvalidTaskId(input.to_string()));
    }
    let target = parts.next().map(str::to_string).filter(|t| !t.is_empty());
    Ok(Self {
      name: name.to_string(),
      target,
      args: parts.map(str::to_string).collect(),
    })
  }
}

/// One unit of execution: a handler task applied to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
  pub task: String,
  pub target: String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub args: Vec<String>,
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.task, self.target)?;
    for arg in &self.args {
      write!(f, ":{arg}")?;
    }
    Ok(())
  }
}

/// Errors found while planning a run. No step has executed when one of
/// these is returned.
#[derive(Debug, Error)]
pub enum RunError {
  #[error("task not found: '{0}'")]
  TaskNotFound(String),

  #[error("target '{target}' not found for task '{task}'")]
  TargetNotFound { task: String, target: String },

  #[error("task '{0}' has no targets configured")]
  NoTargets(String),

  #[error("alias cycle: {}", chain.join(" -> "))]
  AliasCycle { chain: Vec<String> },

  #[error("'{id}' names a target of alias '{alias}'; aliases have no targets")]
  AliasTarget { alias: String, id: String },

  #[error("invalid task identifier: '{0}'")]
  InvalidTaskId(String),
}

/// Errors from a single step.
#[derive(Debug, Error)]
pub enum StepError {
  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error(transparent)]
  Files(#[from] FilesError),

  #[error(transparent)]
  Handler(#[from] HandlerError),

  #[error("invalid target configuration: {0}")]
  InvalidTarget(String),

  #[error("'{0}' is not registered as a handler task")]
  NotAHandler(String),
}

/// A file written by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
  pub path: PathBuf,
  pub hash: ContentHash,
}

/// Outcome of a step that succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
  pub step: Step,
  pub outputs: Vec<Artifact>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub removed: Vec<PathBuf>,
  #[serde(skip)]
  pub duration: Duration,
}

/// Where a run stands.
///
/// `Pending -> Running(0) -> ... -> Running(n-1) -> Completed`, or
/// `Running(i) -> Failed(i)` on the first failing step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum RunState {
  #[default]
  Pending,
  Running(usize),
  Completed,
  Failed(usize),
}

/// Result of running a list of tasks.
#[derive(Debug, Default)]
pub struct RunReport {
  /// Every planned step, in execution order.
  pub planned: Vec<Step>,

  /// Steps that succeeded, in order.
  pub completed: Vec<StepReport>,

  /// The step that failed (at most one, stops the run).
  pub failed: Option<(Step, StepError)>,

  /// Steps that never ran because an earlier step failed.
  pub skipped: Vec<Step>,

  pub state: RunState,
}

impl RunReport {
  /// Terminal state of the run.
  pub fn status(&self) -> RunState {
    self.state
  }

  /// Returns true if every planned step completed.
  pub fn is_success(&self) -> bool {
    self.state == RunState::Completed
  }

  /// All files written during the run, in order.
  pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
    self.completed.iter().flat_map(|report| report.outputs.iter())
  }

  /// Total time spent in completed steps.
  pub fn duration(&self) -> Duration {
    self.completed.iter().map(|report| report.duration).sum()
  }
}

/// A registered task as shown by `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaskInfo {
  Alias { name: String, tasks: Vec<String> },
  Handler { name: String, targets: Vec<String> },
}

impl TaskInfo {
  pub fn name(&self) -> &str {
    match self {
      TaskInfo::Alias { name, .. } | TaskInfo::Handler { name, .. } => name,
    }
  }
}
