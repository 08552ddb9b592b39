//! sieve: filter and reshape line streams with small compiled queries.
//!
//! Provides `sieve run` to apply a query to standard input (optionally fanning
//! the results out to a pool of worker processes), `sieve check` to compile a
//! query and report diagnostics, and `sieve cache` to inspect or clear the
//! compiled-artifact cache.

#![warn(missing_docs)]

mod cache;
mod check;
mod pipeline;
mod run;

use std::io::IsTerminal;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;

use clap::{Args, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// sieve, a compiled line-stream filter.
#[derive(Parser, Debug)]
#[command(name = "sieve", version, about = "Filter line streams with compiled queries")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `sieve.toml` configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding compiled artifacts.
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a query to every input line.
    Run(RunArgs),
    /// Compile a query and report diagnostics without running it.
    Check(CheckArgs),
    /// Inspect or clear the artifact cache.
    Cache {
        /// What to do with the cache.
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Options that select and compile the query program.
#[derive(Args, Debug)]
pub struct ProgramArgs {
    /// Query text. Each value adds one or more lines to the program.
    #[arg(value_name = "CODE")]
    pub code: Vec<String>,

    /// Append the lines of FILE to the program, in command-line order with CODE.
    #[arg(short, long, value_name = "FILE")]
    pub import: Vec<PathBuf>,

    /// Import a query library (`core` and `text` are always imported).
    #[arg(short = 'u', long = "use", value_name = "LIB")]
    pub uses: Vec<String>,

    /// Compile without reading or writing the artifact cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Output format for diagnostics.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `sieve run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// The query program.
    #[command(flatten)]
    pub program: ProgramArgs,

    /// Extra value made available to the query as `args`.
    #[arg(short = 'a', long = "arg", value_name = "VALUE")]
    pub args: Vec<String>,

    /// Separator between output lines; `\t`, `\n`, `\r` and `\\` escapes are decoded.
    #[arg(short, long, value_name = "SEP")]
    pub separator: Option<String>,

    /// Number of worker processes for fan-out.
    #[arg(short, long, value_name = "N")]
    pub workers: Option<NonZeroUsize>,

    /// Worker program; enables fan-out.
    #[arg(short = 'x', long = "exec", value_name = "PROGRAM")]
    pub exec: Option<String>,

    /// Arguments for the worker program, split like a shell would.
    #[arg(long, value_name = "STRING", allow_hyphen_values = true)]
    pub exec_args: Option<String>,

    /// Read input lines from FILE instead of standard input.
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,
}

/// Arguments for the `sieve check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// The query program.
    #[command(flatten)]
    pub program: ProgramArgs,
}

/// `sieve cache` actions.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Print the cache directory.
    Path,
    /// Delete every cached artifact.
    Clear,
    /// List cached artifacts.
    List,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// One JSON object per line.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a config file.
    pub config: Option<PathBuf>,
    /// Optional cache directory override.
    pub cache_dir: Option<PathBuf>,
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
        cache_dir: cli.cache_dir,
    };
    init_tracing(&global);

    let sub_matches = matches.subcommand().map(|(_, m)| m);
    let result = match cli.command {
        Command::Run(ref args) => {
            let parts = pipeline::program_parts(&args.program, sub_matches);
            run::run(args, parts, &global)
        }
        Command::Check(ref args) => {
            let parts = pipeline::program_parts(&args.program, sub_matches);
            check::run(args, parts, &global)
        }
        Command::Cache { action } => cache::run(action, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(pipeline::EXIT_RUNTIME);
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over the
/// `--verbose`/`--quiet` defaults.
fn init_tracing(global: &GlobalArgs) {
    let default_level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(global.color);
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::registry().with(layer).with(filter).try_init();
}
