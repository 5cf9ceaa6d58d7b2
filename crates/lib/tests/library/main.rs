//! Library integration tests: taskfiles run end to end against a project on
//! disk.

mod common;
mod pipeline_tests;
mod watch_tests;
