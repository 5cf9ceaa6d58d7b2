//! Test helpers for building `exec` commands that work on every platform.

use serde_json::{Value, json};

/// `command` option value running `script` through the platform shell.
///
/// Extra `args` follow the script; on Unix they are `$0`, `$1`, ...
#[cfg(unix)]
pub fn shell_command(script: &str, args: &[&str]) -> Value {
  let mut argv = vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()];
  argv.extend(args.iter().map(|arg| arg.to_string()));
  json!(argv)
}

#[cfg(windows)]
pub fn shell_command(script: &str, args: &[&str]) -> Value {
  let mut argv = vec!["cmd.exe".to_string(), "/C".to_string(), script.to_string()];
  argv.extend(args.iter().map(|arg| arg.to_string()));
  json!(argv)
}

/// `command` option value that copies `{src}` to `{dest}`.
#[cfg(unix)]
pub fn copy_command() -> Value {
  shell_command("cp \"$0\" \"$1\"", &["{src}", "{dest}"])
}

#[cfg(windows)]
pub fn copy_command() -> Value {
  shell_command("copy /Y {src} {dest}", &[])
}

/// `command` option value that fails with `code` after printing `message`.
#[cfg(unix)]
pub fn failing_command(message: &str, code: i32) -> Value {
  shell_command(&format!("echo \"{message}\" >&2; exit {code}"), &[])
}

#[cfg(windows)]
pub fn failing_command(message: &str, code: i32) -> Value {
  shell_command(&format!("echo {message} 1>&2 & exit /B {code}"), &[])
}
