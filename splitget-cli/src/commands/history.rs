//! `splitget history`: inspect and edit the download ledger.

use std::path::Path;

use clap::Subcommand;
use console::style;
use splitget::ledger::HistoryLedger;

use super::common::load_config;
use crate::error::CliError;

/// History subcommands.
#[derive(Debug, Subcommand)]
pub enum HistoryCommands {
    /// List remembered downloads
    List,

    /// Forget a URL so the next request downloads it again
    Forget {
        /// Source URL of the download
        url: String,
    },
}

/// Run a history subcommand.
pub fn run(command: HistoryCommands, config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let ledger = HistoryLedger::new(&config.paths.history_file);

    match command {
        HistoryCommands::List => run_list(&ledger),
        HistoryCommands::Forget { url } => run_forget(&ledger, &url),
    }
}

fn run_list(ledger: &HistoryLedger) -> Result<(), CliError> {
    let entries = ledger.entries()?;
    if entries.is_empty() {
        println!("No downloads recorded in {}", ledger.path().display());
        return Ok(());
    }

    for record in &entries {
        let marker = if record.is_backed() {
            style("ok").green()
        } else {
            style("missing").red()
        };
        println!("[{}] {}  {}", marker, record.completed_at, record.source);
        println!("      -> {}", record.final_path.display());
        if !record.published_url.is_empty() {
            println!("         {}", record.published_url);
        }
    }

    println!();
    println!("{} entries", entries.len());
    Ok(())
}

fn run_forget(ledger: &HistoryLedger, url: &str) -> Result<(), CliError> {
    if ledger.invalidate(url)? {
        println!("Forgot {}", url);
    } else {
        println!("No history entry for {}", url);
    }
    Ok(())
}
