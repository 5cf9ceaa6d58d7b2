//! Implementation of the `conveyor run` command.
//!
//! Plans the given tasks, runs the steps in order and prints what each step
//! produced. Any failure makes the command exit non-zero.

use anyhow::{Context, Result, bail};
use serde::Serialize;

use conveyor_lib::consts::DEFAULT_TASK;
use conveyor_lib::orchestrator::{Orchestrator, RunReport, RunState, Step, StepReport};

use crate::output::{
  OutputFormat, format_duration, print_error, print_json, print_removed, print_step, print_success, print_warning,
  print_written,
};

#[derive(Serialize)]
struct RunSummary<'a> {
  tasks: &'a [String],
  success: bool,
  status: RunState,
  completed: &'a [StepReport],
  #[serde(skip_serializing_if = "Option::is_none")]
  failed: Option<FailedStep<'a>>,
  skipped: &'a [Step],
  duration_ms: u64,
}

#[derive(Serialize)]
struct FailedStep<'a> {
  step: &'a Step,
  error: String,
}

impl<'a> RunSummary<'a> {
  fn new(tasks: &'a [String], report: &'a RunReport) -> Self {
    Self {
      tasks,
      success: report.is_success(),
      status: report.status(),
      completed: &report.completed,
      failed: report.failed.as_ref().map(|(step, err)| FailedStep {
        step,
        error: err.to_string(),
      }),
      skipped: &report.skipped,
      duration_ms: report.duration().as_millis() as u64,
    }
  }
}

pub fn cmd_run(orchestrator: &Orchestrator, tasks: &[String], format: OutputFormat) -> Result<()> {
  let tasks = if tasks.is_empty() {
    vec![DEFAULT_TASK.to_string()]
  } else {
    tasks.to_vec()
  };

  let report = orchestrator
    .run_all(&tasks)
    .with_context(|| format!("Cannot run {}", tasks.join(" ")))?;

  if format.is_json() {
    print_json(&RunSummary::new(&tasks, &report))?;
  } else {
    print_report(&report);
  }

  if let Some((step, err)) = &report.failed {
    bail!("Task \"{}\" failed: {}", step, err);
  }
  Ok(())
}

fn print_report(report: &RunReport) {
  for step in &report.completed {
    print_step(&step.step, step.duration);
    for artifact in &step.outputs {
      print_written(&artifact.path, &artifact.hash);
    }
    for path in &step.removed {
      print_removed(path);
    }
  }

  if let Some((step, err)) = &report.failed {
    print_error(&format!("{}: {}", step, err));
    if !report.skipped.is_empty() {
      let skipped: Vec<String> = report.skipped.iter().map(ToString::to_string).collect();
      print_warning(&format!("Skipped: {}", skipped.join(", ")));
    }
    return;
  }

  println!();
  print_success(&format!(
    "Done: {} step(s) in {}",
    report.completed.len(),
    format_duration(report.duration())
  ));
}
