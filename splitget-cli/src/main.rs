//! splitget CLI - command-line front end
//!
//! Downloads a URL with parallel range requests, remembers the result, and
//! manages the configuration file and download history.

mod commands;
mod error;
mod progress;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use console::style;
use splitget::logging::{default_log_dir, init_logging};

use commands::common::resolve_config_path;
use commands::config::ConfigCommands;
use commands::get::GetArgs;
use commands::history::HistoryCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "splitget", version, about = "Parallel byte-range HTTP downloader")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download a file
    Get(GetArgs),

    /// Inspect or edit the download history
    #[command(subcommand)]
    History(HistoryCommands),

    /// View or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let _log_guard = match init_logging(&default_log_dir(), "splitget.log", cli.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("{} logging disabled: {}", style("warning:").yellow().bold(), e);
            None
        }
    };

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "command failed");
        eprintln!("{} {}", style("error:").red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = resolve_config_path(cli.config);

    match cli.command {
        Commands::Get(args) => commands::get::run(args, &config_path),
        Commands::History(command) => commands::history::run(command, &config_path),
        Commands::Config(command) => commands::config::run(command, &config_path),
    }
}
