//! Implementation of the `conveyor list` command.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde_json::json;

use conveyor_lib::orchestrator::{Orchestrator, TaskInfo};

use crate::output::{OutputFormat, print_info, print_json, symbols};

pub fn cmd_list(orchestrator: &Orchestrator, format: OutputFormat) -> Result<()> {
  let tasks = orchestrator.tasks();
  let package = orchestrator.package();
  let functions: Vec<&str> = orchestrator.context().function_names().collect();
  let delimiters: Vec<&str> = orchestrator.delimiters().names().collect();

  if format.is_json() {
    return print_json(&json!({
      "package": package,
      "tasks": tasks,
      "functions": functions,
      "delimiters": delimiters,
    }));
  }

  if let Some(package) = package {
    print_info(&format!("{} v{}", package.display_name(), package.version));
    println!();
  }

  if tasks.is_empty() {
    print_info("No tasks registered.");
  } else {
    println!("Aliases:");
    for task in &tasks {
      if let TaskInfo::Alias { name, tasks } = task {
        println!(
          "  {} {} {}",
          name.if_supports_color(Stream::Stdout, |s| s.bold()),
          symbols::ARROW,
          tasks.join(", ")
        );
      }
    }

    println!();
    println!("Tasks:");
    for task in &tasks {
      if let TaskInfo::Handler { name, targets } = task {
        println!(
          "  {} {}",
          name.if_supports_color(Stream::Stdout, |s| s.bold()),
          format!("({})", targets.join(", ")).if_supports_color(Stream::Stdout, |s| s.dimmed())
        );
      }
    }
  }

  println!();
  println!("Functions: {}", functions.join(", "));
  println!("Delimiters: {}", delimiters.join(", "));

  Ok(())
}
