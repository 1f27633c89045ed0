//! Trellis CLI — the command-line interface for the Trellis theme build tool.
//!
//! Provides `trellis build` for incremental asset builds, `trellis stats` for
//! cache statistics, `trellis clean` to drop the cache, and `trellis report`
//! for build history and stage trends.

#![warn(missing_docs)]

mod analyze;
mod build;
mod clean;
mod pipeline;
mod report;
mod stats;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

/// Trellis — an incremental Shopify theme build tool.
#[derive(Parser, Debug)]
#[command(name = "trellis", version, about = "Trellis theme build tool")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the project root or a `trellis.toml` file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy changed theme sources into the build tree.
    Build(BuildArgs),
    /// Print cache statistics.
    Stats,
    /// Delete the cache directory.
    Clean,
    /// Print build history and per-stage trends.
    Report,
}

/// Arguments for the `trellis build` subcommand.
#[derive(Parser, Debug, Default)]
pub struct BuildArgs {
    /// Override the source directory from the configuration.
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Override the build output directory from the configuration.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Treat every file as changed for this run.
    #[arg(long)]
    pub no_cache: bool,

    /// Keep processing on the ordered micro-batch path.
    #[arg(long)]
    pub no_parallel: bool,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to the project root or config file.
    pub config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Stats => stats::run(&global),
        Command::Clean => clean::run(&global),
        Command::Report => report::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Initializes the logger with a level derived from the verbosity flags.
fn init_logging(quiet: bool, verbose: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
