//! Task registry, planning and sequential execution.
//!
//! An [`Orchestrator`] owns the [`Context`] and every registered task. Tasks
//! are either handler tasks, whose targets live in the context section of the
//! same name, or aliases listing other task identifiers.
//!
//! Running a list of tasks happens in two phases:
//!
//! 1. **Plan**: identifiers are expanded into [`Step`]s. Aliases expand
//!    recursively, a handler task without a target expands to all of its
//!    configured targets. Unknown tasks, missing targets and alias cycles fail
//!    here, before anything has run.
//! 2. **Execute**: steps run one at a time, in order. For each step the
//!    target's files and options are resolved against a fresh [`Scope`], the
//!    handler is invoked, and the run stops at the first failure.
//!
//! Files written by completed steps stay on disk when a later step fails.

mod types;

pub use types::*;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use serde_json::{Map, Value};
use tracing::{debug, error, info, info_span};

use crate::consts::{CONFIG_DELIMITERS, OPTIONS_KEY};
use crate::context::{Context, CurrentTask, Scope, value_kind};
use crate::files::{self, slash_path};
use crate::handler::{Handler, HandlerError, Invocation, StepOutput};
use crate::manifest::PackageInfo;
use crate::template::{self, DelimiterSet, Delimiters, TemplateError};
use crate::util::hash::hash_file;

/// What a task name is bound to.
pub enum TaskRegistration {
  /// Work done per target by a handler.
  Handler(Box<dyn Handler>),
  /// An ordered list of task identifiers.
  Alias(Vec<String>),
}

impl std::fmt::Debug for TaskRegistration {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TaskRegistration::Handler(_) => f.write_str("Handler(..)"),
      TaskRegistration::Alias(tasks) => f.debug_tuple("Alias").field(tasks).finish(),
    }
  }
}

/// Registry, context and delimiters of one process.
#[derive(Debug)]
pub struct Orchestrator {
  context: Context,
  registry: BTreeMap<String, TaskRegistration>,
  delimiters: DelimiterSet,
  base_dir: PathBuf,
  package: Option<PackageInfo>,
}

impl Orchestrator {
  /// Create an orchestrator resolving relative paths against `base_dir`.
  pub fn new(context: Context, base_dir: impl Into<PathBuf>) -> Self {
    Self {
      context,
      registry: BTreeMap::new(),
      delimiters: DelimiterSet::default(),
      base_dir: base_dir.into(),
      package: None,
    }
  }

  pub fn context(&self) -> &Context {
    &self.context
  }

  pub fn base_dir(&self) -> &Path {
    &self.base_dir
  }

  pub fn delimiters(&self) -> &DelimiterSet {
    &self.delimiters
  }

  /// Summary of the loaded package manifest, if any.
  pub fn package(&self) -> Option<&PackageInfo> {
    self.package.as_ref()
  }

  pub fn set_package(&mut self, package: PackageInfo) {
    self.package = Some(package);
  }

  /// Bind `name` to a handler or an alias. An existing registration of the
  /// same name is replaced.
  pub fn register_task(&mut self, name: impl Into<String>, registration: TaskRegistration) {
    let name = name.into();
    if let Some(previous) = self.registry.insert(name.clone(), registration) {
      debug!(task = %name, previous = ?previous, "task registration replaced");
    } else {
      debug!(task = %name, "task registered");
    }
  }

  pub fn register_handler(&mut self, name: impl Into<String>, handler: impl Handler + 'static) {
    self.register_task(name, TaskRegistration::Handler(Box::new(handler)));
  }

  pub fn register_alias<I, S>(&mut self, name: impl Into<String>, tasks: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.register_task(name, TaskRegistration::Alias(tasks.into_iter().map(Into::into).collect()));
  }

  /// Register an alternate delimiter pair usable by handlers that process
  /// file content.
  pub fn add_delimiters(&mut self, name: impl Into<String>, open: &str, close: &str) -> Result<(), TemplateError> {
    let name = name.into();
    if name == CONFIG_DELIMITERS {
      return Err(TemplateError::InvalidDelimiters(format!(
        "'{CONFIG_DELIMITERS}' is reserved for configuration values"
      )));
    }
    self.delimiters.insert(name, Delimiters::new(open, close)?);
    Ok(())
  }

  /// Resolve every placeholder in `value` against the context.
  pub fn resolve(&self, value: &Value) -> Result<Value, TemplateError> {
    template::resolve_value(value, &self.context.scope())
  }

  /// Render `input` with the named delimiters.
  pub fn resolve_str(&self, input: &str, delimiters: &str) -> Result<String, TemplateError> {
    template::process(input, self.delimiters.get(delimiters)?, &self.context.scope())
  }

  /// Registered tasks, sorted by name.
  pub fn tasks(&self) -> Vec<TaskInfo> {
    self
      .registry
      .iter()
      .map(|(name, registration)| match registration {
        TaskRegistration::Alias(tasks) => TaskInfo::Alias {
          name: name.clone(),
          tasks: tasks.clone(),
        },
        TaskRegistration::Handler(_) => TaskInfo::Handler {
          name: name.clone(),
          targets: self.targets(name),
        },
      })
      .collect()
  }

  /// Configured targets of a handler task, in configuration order.
  pub fn targets(&self, task: &str) -> Vec<String> {
    match self.context.section(task) {
      Some(Value::Object(section)) => section.keys().filter(|key| *key != OPTIONS_KEY).cloned().collect(),
      _ => Vec::new(),
    }
  }

  /// Expand task identifiers into the steps they run.
  pub fn plan<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Step>, RunError> {
    let mut steps = Vec::new();
    let mut stack = Vec::new();
    for id in ids {
      self.expand(id.as_ref(), &mut stack, &mut steps)?;
    }
    Ok(steps)
  }

  fn expand(&self, id: &str, stack: &mut Vec<String>, steps: &mut Vec<Step>) -> Result<(), RunError> {
    let task = TaskId::parse(id)?;
    let registration = self
      .registry
      .get(&task.name)
      .ok_or_else(|| RunError::TaskNotFound(task.name.clone()))?;

    match registration {
      TaskRegistration::Alias(ids) => {
        if task.target.is_some() {
          return Err(RunError::AliasTarget {
            alias: task.name,
            id: id.to_string(),
          });
        }
        if stack.contains(&task.name) {
          let mut chain = stack.clone();
          chain.push(task.name);
          return Err(RunError::AliasCycle { chain });
        }
        stack.push(task.name);
        for child in ids {
          self.expand(child, stack, steps)?;
        }
        stack.pop();
      }
      TaskRegistration::Handler(_) => {
        let targets = self.targets(&task.name);
        match task.target {
          Some(target) => {
            if !targets.contains(&target) {
              return Err(RunError::TargetNotFound { task: task.name, target });
            }
            steps.push(Step {
              task: task.name,
              target,
              args: task.args,
            });
          }
          None => {
            if targets.is_empty() {
              return Err(RunError::NoTargets(task.name));
            }
            steps.extend(targets.into_iter().map(|target| Step {
              task: task.name.clone(),
              target,
              args: Vec::new(),
            }));
          }
        }
      }
    }
    Ok(())
  }

  /// Run a single task.
  pub fn run(&self, id: &str) -> Result<RunReport, RunError> {
    self.run_all(&[id])
  }

  /// Plan `ids` and run the resulting steps in order, stopping at the first
  /// failure. Planning errors are returned before any step runs; step
  /// failures are part of the report.
  pub fn run_all<S: AsRef<str>>(&self, ids: &[S]) -> Result<RunReport, RunError> {
    let names = ids.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
    let span = info_span!("run", tasks = %names);
    let _guard = span.enter();

    let planned = self.plan(ids)?;
    info!(steps = planned.len(), "starting run");

    let mut report = RunReport {
      planned: planned.clone(),
      ..Default::default()
    };

    for (index, step) in planned.iter().enumerate() {
      report.state = RunState::Running(index);
      match self.execute_step(step) {
        Ok(step_report) => report.completed.push(step_report),
        Err(err) => {
          error!(step = %step, error = %err, "step failed");
          report.failed = Some((step.clone(), err));
          report.skipped = planned[index + 1..].to_vec();
          report.state = RunState::Failed(index);
          return Ok(report);
        }
      }
    }

    report.state = RunState::Completed;
    info!(steps = report.completed.len(), "run completed");
    Ok(report)
  }

  fn execute_step(&self, step: &Step) -> Result<StepReport, StepError> {
    let span = info_span!("step", step = %step);
    let _guard = span.enter();
    let started = Instant::now();
    info!("running step");

    let handler = match self.registry.get(&step.task) {
      Some(TaskRegistration::Handler(handler)) => handler,
      _ => return Err(StepError::NotAHandler(step.task.clone())),
    };
    let section = self.context.section(&step.task);
    let target = section
      .and_then(|section| section.get(&step.target))
      .ok_or_else(|| StepError::InvalidTarget(format!("{} has no target '{}'", step.task, step.target)))?;

    let now = Local::now();
    let mut current = CurrentTask {
      name: step.task.clone(),
      target: Some(step.target.clone()),
      args: step.args.clone(),
      files_src: Vec::new(),
    };

    let file_spec = {
      let scope = self.context.scope_at(now).with_current(&current);
      template::resolve_value(&without_options(target), &scope)?
    };
    let mappings = files::expand(&files::normalize(&file_spec)?, &self.base_dir)?;
    debug!(mappings = ?mappings, "expanded files");

    current.files_src = mappings
      .iter()
      .flat_map(|mapping| mapping.src.iter())
      .map(|src| slash_path(src))
      .collect();
    let scope = self.context.scope_at(now).with_current(&current);
    let options = self.options(section, target, &scope)?;
    debug!(options = ?options, "resolved options");

    let invocation = Invocation {
      step,
      files: &mappings,
      options: &options,
      base_dir: &self.base_dir,
      scope: &scope,
      delimiters: &self.delimiters,
    };
    let StepOutput { written, removed } = handler.run(&invocation)?;

    let mut outputs = Vec::with_capacity(written.len());
    for path in written {
      let full = self.base_dir.join(&path);
      let hash = hash_file(&full).map_err(|e| HandlerError::io("failed to hash", &full, e))?;
      debug!(path = %path.display(), hash = %hash.short(), "artifact");
      outputs.push(Artifact { path, hash });
    }

    let duration = started.elapsed();
    info!(outputs = outputs.len(), ms = duration.as_millis() as u64, "step completed");
    Ok(StepReport {
      step: step.clone(),
      outputs,
      removed,
      duration,
    })
  }

  /// Task-level options shallowly overridden by target-level options,
  /// resolved against `scope`.
  fn options(&self, section: Option<&Value>, target: &Value, scope: &Scope<'_>) -> Result<Map<String, Value>, StepError> {
    let mut merged = options_of(section, "task")?;
    merged.extend(options_of(Some(target), "target")?);
    match template::resolve_value(&Value::Object(merged), scope)? {
      Value::Object(map) => Ok(map),
      other => Err(StepError::InvalidTarget(format!(
        "options resolved to {}",
        value_kind(&other)
      ))),
    }
  }
}

fn options_of(value: Option<&Value>, level: &str) -> Result<Map<String, Value>, StepError> {
  match value.and_then(|value| value.get(OPTIONS_KEY)) {
    None | Some(Value::Null) => Ok(Map::new()),
    Some(Value::Object(map)) => Ok(map.clone()),
    Some(other) => Err(StepError::InvalidTarget(format!(
      "{level} options must be a mapping, found {}",
      value_kind(other)
    ))),
  }
}

fn without_options(target: &Value) -> Value {
  match target {
    Value::Object(map) => Value::Object(
      map
        .iter()
        .filter(|(key, _)| *key != OPTIONS_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect(),
    ),
    other => other.clone(),
  }
}
