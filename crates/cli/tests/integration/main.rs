//! CLI integration tests: the `conveyor` binary against projects on disk.

mod common;
mod list_tests;
mod resolve_tests;
mod run_tests;
