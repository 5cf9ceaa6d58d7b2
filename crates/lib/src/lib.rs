//! conveyor-lib: configuration-driven build pipelines.
//!
//! This crate provides the pieces behind the `conveyor` binary:
//! - `Taskfile`: YAML declaration of context data, tasks and aliases
//! - `Context`: the data placeholders resolve against
//! - `template`: `<%= path %>` placeholder resolution with named delimiters
//! - `Orchestrator`: task registry, planning and fail-fast sequential runs
//! - `handler`: built-in task kinds (clean, copy, concat, exec)
//! - `watch`: re-running tasks on file changes

pub mod consts;
pub mod context;
pub mod files;
pub mod handler;
pub mod init;
pub mod manifest;
pub mod orchestrator;
pub mod taskfile;
pub mod template;
pub mod util;
pub mod watch;
