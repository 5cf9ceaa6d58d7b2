//! `exec`: delegate a target to an external program.
//!
//! Compilers, linters, minifiers and test runners are not implemented here.
//! A task bound to `exec` describes how to call them:
//!
//! ```yaml
//! plugins:
//!   sass: exec
//! config:
//!   sass:
//!     options:
//!       command: [sass, "--style=expanded", "{src}", "{dest}"]
//!     themes:
//!       files:
//!         - { expand: true, cwd: _source/lib/themes, src: ["*.scss"], dest: lib/themes, ext: .css }
//! ```
//!
//! Tokens in `command` arguments:
//! - `{src}` and `{dest}` are replaced by the current source and destination;
//!   the command runs once per source file.
//! - An argument that is exactly `{srcs}` expands to every source of the
//!   mapping; the command then runs once per mapping.
//!
//! Paths are relative to the base directory, or absolute when `cwd` is set.
//! Without any file mappings the command runs once.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tracing::{debug, info};

use super::{Handler, HandlerError, Invocation, StepOutput};
use crate::files::FileMapping;

const SRC: &str = "{src}";
const SRCS: &str = "{srcs}";
const DEST: &str = "{dest}";

/// Lines of command output kept in a failure report.
const OUTPUT_TAIL: usize = 20;

pub struct ExecHandler;

impl Handler for ExecHandler {
  fn run(&self, invocation: &Invocation<'_>) -> Result<StepOutput, HandlerError> {
    invocation.require_sources()?;
    let command = invocation
      .option_list("command")?
      .filter(|argv| !argv.is_empty())
      .ok_or_else(|| HandlerError::option("command", "exec needs a command"))?;
    let runner = Runner {
      invocation,
      cwd: invocation.option_str("cwd")?.map(|cwd| invocation.path(Path::new(cwd))),
      env: env_option(invocation)?,
    };

    if invocation.files.is_empty() {
      runner.spawn(&command)?;
    } else if command.iter().any(|arg| arg == SRCS) {
      for mapping in invocation.files {
        let srcs: Vec<String> = mapping.src.iter().map(|src| runner.display(src)).collect();
        let argv = command
          .iter()
          .flat_map(|arg| {
            if arg == SRCS {
              srcs.clone()
            } else {
              vec![runner.substitute(arg, None, mapping)]
            }
          })
          .collect::<Vec<_>>();
        runner.spawn(&argv)?;
      }
    } else {
      for mapping in invocation.files {
        if mapping.src.is_empty() {
          debug!(dest = ?mapping.dest, "no sources matched, skipping");
        }
        for src in &mapping.src {
          let argv = command
            .iter()
            .map(|arg| runner.substitute(arg, Some(src), mapping))
            .collect::<Vec<_>>();
          runner.spawn(&argv)?;
        }
      }
    }

    let mut output = StepOutput::default();
    let banner = invocation.option_str("banner")?.filter(|banner| !banner.is_empty());
    for dest in invocation.files.iter().filter_map(|mapping| mapping.dest.as_ref()) {
      let path = invocation.path(dest);
      if !path.is_file() || output.written.contains(dest) {
        continue;
      }
      if let Some(banner) = banner {
        prepend(&path, banner)?;
      }
      output.written.push(dest.clone());
    }

    Ok(output)
  }
}

struct Runner<'i, 'a> {
  invocation: &'i Invocation<'a>,
  cwd: Option<PathBuf>,
  env: BTreeMap<String, String>,
}

impl Runner<'_, '_> {
  /// A path as the command should see it.
  fn display(&self, rel: &Path) -> String {
    match self.cwd {
      Some(_) => self.invocation.path(rel).to_string_lossy().into_owned(),
      None => rel.to_string_lossy().into_owned(),
    }
  }

  fn substitute(&self, arg: &str, src: Option<&PathBuf>, mapping: &FileMapping) -> String {
    let mut arg = arg.to_string();
    if let Some(src) = src {
      arg = arg.replace(SRC, &self.display(src));
    }
    if let Some(dest) = &mapping.dest {
      arg = arg.replace(DEST, &self.display(dest));
    }
    arg
  }

  fn spawn(&self, argv: &[String]) -> Result<(), HandlerError> {
    let Some((program, args)) = argv.split_first() else {
      return Err(HandlerError::option("command", "exec needs a command"));
    };
    let cmdline = argv.join(" ");
    let working_dir = self.cwd.as_deref().unwrap_or(self.invocation.base_dir);

    info!(cmd = %cmdline, "executing command");
    debug!(working_dir = ?working_dir, "spawning process");

    let output = Command::new(program)
      .args(args)
      .current_dir(working_dir)
      .envs(&self.env)
      .output()
      .map_err(|source| HandlerError::Spawn {
        program: program.clone(),
        source,
      })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
      debug!(stdout = %stdout.trim(), "command stdout");
    }
    if !stderr.trim().is_empty() {
      debug!(stderr = %stderr.trim(), "command stderr");
    }

    if !output.status.success() {
      return Err(HandlerError::CommandFailed {
        cmd: cmdline,
        code: output.status.code(),
        output: tail(&format!("{stdout}{stderr}"), OUTPUT_TAIL),
      });
    }
    Ok(())
  }
}

fn env_option(invocation: &Invocation<'_>) -> Result<BTreeMap<String, String>, HandlerError> {
  match invocation.option("env") {
    None | Some(Value::Null) => Ok(BTreeMap::new()),
    Some(Value::Object(map)) => map
      .iter()
      .map(|(key, value)| match value {
        Value::String(s) => Ok((key.clone(), s.clone())),
        Value::Number(n) => Ok((key.clone(), n.to_string())),
        Value::Bool(b) => Ok((key.clone(), b.to_string())),
        _ => Err(HandlerError::option("env", format!("value of {key} must be a scalar"))),
      })
      .collect(),
    Some(_) => Err(HandlerError::option("env", "expected a mapping")),
  }
}

fn prepend(path: &Path, banner: &str) -> Result<(), HandlerError> {
  let content = fs::read(path).map_err(|e| HandlerError::io("failed to read", path, e))?;
  let mut bytes = banner.as_bytes().to_vec();
  bytes.extend(content);
  fs::write(path, bytes).map_err(|e| HandlerError::io("failed to write", path, e))
}

fn tail(output: &str, lines: usize) -> String {
  let all: Vec<&str> = output.trim_end().lines().collect();
  all[all.len().saturating_sub(lines)..].join("\n")
}
