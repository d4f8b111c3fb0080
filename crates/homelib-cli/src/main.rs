//! Command line interface for the homelib FB2 library tools.
//!
//! This crate provides the `homelib` binary, a thin layer over the `homelib` library. It supports:
//! - Writing a configuration file
//! - Extracting metadata from every FB2 entry of a directory of archives
//! - Surveying the root element and namespaces of every entry
//! - Listing the distinct values of a stored column
//! - Purging the entries listed in the deletion table from the archives
//!
//! # Usage
//!
//! ```bash
//! # Write ~/.homelib/config.toml
//! homelib init
//!
//! # Stream the catalog of ./lib into the results table
//! homelib extract --extractor catalog --dir ./lib --stream
//!
//! # Dump every genre of every entry to a JSON file
//! homelib extract --extractor numbered --tag genre --dir ./lib --json genres.json
//!
//! # Distinct genres seen so far
//! homelib values --column genre
//!
//! # Remove the entries listed in the deletion table, previewing first
//! homelib purge --dir ./lib --dry-run
//! homelib purge --dir ./lib
//! ```
//!
//! Without `--dir`, the commands that process archives ask to pick an archive from the configured
//! library directory and process the directory that archive is in.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
};

use clap::{builder::ArgAction, Args, Parser, Subcommand};
use console::style;
use homelib::{config::Config, database::Database, error::HomelibError, prelude::*};
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;
pub mod interaction;

use crate::{commands::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Metadata extraction and maintenance for FB2 e-book libraries")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to the configuration file. Defaults to `~/.homelib/config.toml`.
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Path to the database file, overriding the configured one.
  #[arg(long, global = true)]
  db: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,

  /// Skip all prompts and accept defaults (mostly for testing)
  #[arg(long, hide = true, global = true)]
  accept_defaults: bool,
}

impl Cli {
  /// Configuration file in use.
  pub fn config_path(&self) -> PathBuf { self.config.clone().unwrap_or_else(Config::default_path) }

  /// Loads the configuration and applies the command line overrides.
  pub fn load_config(&self) -> Result<Config> {
    let mut config = Config::load(self.config_path())?;
    if let Some(db) = &self.db {
      config = config.with_database_path(db);
    }
    trace!("Using configuration {config:?}");
    Ok(config)
  }
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// `RUST_LOG` takes precedence when set. Logs go to stderr so command output stays clean.
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_target(true)
    .init();
}

/// Runs the selected command.
fn run(cli: &Cli) -> Result<()> {
  match &cli.command {
    Commands::Init(options) => init(cli, options),
    Commands::Extract(options) => extract(cli, options),
    Commands::Survey(options) => survey(cli, options),
    Commands::Purge(options) => purge(cli, options),
    Commands::Values(options) => values(cli, options),
  }
}

/// Entry point for the homelib CLI application
///
/// Parses the command line, sets up logging and executes the requested command. Failures are
/// printed and turned into a non-zero exit code.
fn main() -> ExitCode {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  match run(&cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      debug!("Command failed: {e:?}");
      eprintln!("{} {e}", style(ERROR_PREFIX).red());
      ExitCode::FAILURE
    },
  }
}
