//! Implementation of the `conveyor watch` command.

use std::ops::ControlFlow;

use anyhow::{Context, Result};

use conveyor_lib::orchestrator::Orchestrator;
use conveyor_lib::watch::{WatchConfig, watch};

use crate::output::{format_duration, print_error, print_info, print_success, symbols};

pub fn cmd_watch(orchestrator: &Orchestrator, targets: &[String]) -> Result<()> {
  let config = WatchConfig::from_orchestrator(orchestrator, targets).context("Invalid watch configuration")?;

  for target in &config.targets {
    print_info(&format!(
      "Watching {}: {} {} {}",
      target.name,
      target.patterns.join(" "),
      symbols::ARROW,
      target.tasks.join(", ")
    ));
  }

  watch(orchestrator, &config, |target, result| {
    match result {
      Ok(report) => match &report.failed {
        None => print_success(&format!(
          "{}: {} step(s) in {}",
          target.name,
          report.completed.len(),
          format_duration(report.duration())
        )),
        Some((step, err)) => print_error(&format!("{}: {} failed: {}", target.name, step, err)),
      },
      Err(err) => print_error(&format!("{}: {}", target.name, err)),
    }
    ControlFlow::Continue(())
  })
  .context("Watcher failed")
}
