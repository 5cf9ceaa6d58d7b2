//! Implementation of the `conveyor resolve` command.

use anyhow::{Context, Result};
use serde_json::json;

use conveyor_lib::orchestrator::Orchestrator;

use crate::output::{OutputFormat, print_json};

/// Print `template` resolved against the taskfile's context.
pub fn cmd_resolve(orchestrator: &Orchestrator, template: &str, delimiters: &str, format: OutputFormat) -> Result<()> {
  let value = orchestrator
    .resolve_str(template, delimiters)
    .with_context(|| format!("Failed to resolve: {}", template))?;

  if format.is_json() {
    print_json(&json!({ "template": template, "value": value }))?;
  } else {
    println!("{}", value);
  }
  Ok(())
}
