/// Taskfile looked up when none is given on the command line.
pub const DEFAULT_TASKFILE: &str = "conveyor.yml";

/// Task run when no task name is given.
pub const DEFAULT_TASK: &str = "default";

/// Context key the package manifest is stored under.
pub const DEFAULT_MANIFEST_KEY: &str = "pkg";

/// Name of the built-in `<% %>` delimiter set used for config values.
pub const CONFIG_DELIMITERS: &str = "config";

/// Reserved key holding task or target options.
pub const OPTIONS_KEY: &str = "options";

/// Config section read by watch mode.
pub const WATCH_SECTION: &str = "watch";

/// Debounce window for watch mode, in milliseconds.
pub const DEFAULT_WATCH_DEBOUNCE_MS: u64 = 250;
