//! Terminal output for run reports.
//!
//! Status lines go to stdout, failures and warnings to stderr. Colors are
//! only used when the stream supports them.

use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use conveyor_lib::util::hash::ContentHash;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const WRITTEN: &str = "+";
  pub const REMOVED: &str = "-";
}

/// `850ms`, `2.35s` or `3m 12s`.
pub fn format_duration(duration: Duration) -> String {
  match duration.as_secs() {
    0 => format!("{}ms", duration.as_millis()),
    secs @ 1..=59 => format!("{}.{:02}s", secs, duration.subsec_millis() / 10),
    secs => format!("{}m {}s", secs / 60, secs % 60),
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

/// `✓ concat:lib (12ms)`
pub fn print_step(step: impl Display, duration: Duration) {
  print_success(&format!(
    "{} {}",
    step,
    format!("({})", format_duration(duration)).if_supports_color(Stream::Stdout, |s| s.dimmed())
  ));
}

/// `  + lib/pickadate.date.js 3f2a9c01b7e4`
pub fn print_written(path: &Path, hash: &ContentHash) {
  println!(
    "  {} {} {}",
    symbols::WRITTEN.if_supports_color(Stream::Stdout, |s| s.green()),
    path.display(),
    hash.short().if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
}

/// `  - lib`
pub fn print_removed(path: &Path) {
  println!(
    "  {} {}",
    symbols::REMOVED.if_supports_color(Stream::Stdout, |s| s.red()),
    path.display()
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{json}");
  Ok(())
}
