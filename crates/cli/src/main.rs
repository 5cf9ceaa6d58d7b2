mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use conveyor_lib::consts::{CONFIG_DELIMITERS, DEFAULT_TASKFILE};
use conveyor_lib::orchestrator::Orchestrator;
use conveyor_lib::taskfile;

use output::OutputFormat;

/// conveyor - configuration-driven build pipelines
#[derive(Parser)]
#[command(name = "conveyor")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the taskfile
  #[arg(short, long, global = true, default_value = DEFAULT_TASKFILE)]
  file: PathBuf,

  /// Base directory for relative paths (default: the taskfile's directory)
  #[arg(long, global = true)]
  base: Option<PathBuf>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run tasks in order, stopping at the first failure
  Run {
    /// Tasks to run: aliases, tasks or task:target (default: "default")
    tasks: Vec<String>,
  },

  /// List registered tasks and their targets
  List,

  /// Resolve a template string against the context
  Resolve {
    /// Template to resolve, e.g. "<%= dirs.lib.dest %>/main.js"
    template: String,

    /// Named delimiter set to use
    #[arg(short, long, default_value = CONFIG_DELIMITERS)]
    delimiters: String,
  },

  /// Watch source files and re-run tasks when they change
  Watch {
    /// Watch targets to enable (default: all)
    targets: Vec<String>,
  },

  /// Write a starter taskfile
  Init {
    /// Project directory
    #[arg(default_value = ".")]
    dir: PathBuf,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Run { ref tasks } => cmd::cmd_run(&load(&cli)?, tasks, cli.output),
    Commands::List => cmd::cmd_list(&load(&cli)?, cli.output),
    Commands::Resolve {
      ref template,
      ref delimiters,
    } => cmd::cmd_resolve(&load(&cli)?, template, delimiters, cli.output),
    Commands::Watch { ref targets } => cmd::cmd_watch(&load(&cli)?, targets),
    Commands::Init { ref dir } => cmd::cmd_init(dir),
  }
}

fn load(cli: &Cli) -> Result<Orchestrator> {
  taskfile::load(&cli.file, cli.base.as_deref())
    .with_context(|| format!("Failed to load taskfile: {}", cli.file.display()))
}
