//! Implementation of the `conveyor init` command.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use conveyor_lib::init::init;

use crate::output::symbols;

/// Write a starter `conveyor.yml` into `dir`.
///
/// # Errors
///
/// Returns an error if a taskfile already exists or cannot be written.
pub fn cmd_init(dir: &Path) -> Result<()> {
  let result = init(dir).context("Failed to initialize taskfile")?;

  println!("{} {}", symbols::SUCCESS.green(), "Created taskfile!".green().bold());
  println!();
  println!("  {} Taskfile: {}", symbols::INFO.cyan(), result.taskfile.display());
  println!();
  println!("{}", "Next steps:".bold());
  println!(
    "  1. Edit {} to match your project",
    result.taskfile.display().to_string().cyan()
  );
  println!(
    "  2. Run: {}",
    format!("conveyor -f {} run", result.taskfile.display()).cyan()
  );

  Ok(())
}
