//! `splitget get`: download a URL, or return the remembered result.

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use splitget::config::TransferConfig;
use splitget::naming::resolve_target_name;
use splitget::Downloader;

use super::common::load_config;
use crate::error::CliError;
use crate::progress::DownloadProgress;

/// Arguments for `splitget get`.
#[derive(Debug, Args)]
pub struct GetArgs {
    /// URL to download
    pub url: String,

    /// File name to save as; without an extension the URL's is appended
    pub name: Option<String>,

    /// Number of parallel range requests
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Destination directory for finished files
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Working directory for partial downloads
    #[arg(long)]
    pub temp: Option<PathBuf>,
}

impl GetArgs {
    /// Apply command-line overrides on top of the file configuration.
    pub fn apply(&self, mut config: TransferConfig) -> TransferConfig {
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(dest) = &self.dest {
            config.destination_dir = dest.clone();
        }
        if let Some(temp) = &self.temp {
            config = config.with_temp_dir(temp);
        }
        config
    }
}

/// Run the download.
pub fn run(args: GetArgs, config_path: &Path) -> Result<(), CliError> {
    let config = args.apply(load_config(config_path)?.transfer_config());
    let downloader = Downloader::new(config)?;

    let target = resolve_target_name(&args.url, args.name.as_deref());
    println!("{} {}", style("Downloading").green().bold(), args.url);
    println!("{} {}", style("Save as").green().bold(), target);

    let progress = DownloadProgress::new(&target);
    let result = downloader.download(&args.url, args.name.as_deref(), Some(progress.callback()));
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            progress.abandon();
            return Err(e.into());
        }
    };

    if report.from_history {
        progress.clear();
        println!(
            "{} already downloaded, skipping transfer",
            style("Found").yellow().bold()
        );
    } else {
        progress.finish(report.bytes);
    }

    println!("File:          {}", report.final_path.display());
    println!("Download link: {}", report.published_url);
    match &report.side_artifact {
        Some(path) => println!("Side artifact: {}", path.display()),
        None => println!("Side artifact: (none)"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GetArgs {
        GetArgs {
            url: "https://example.com/a.zip".to_string(),
            name: None,
            workers: None,
            dest: None,
            temp: None,
        }
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let config = TransferConfig::new("/srv").with_workers(7);
        assert_eq!(args().apply(config.clone()), config);
    }

    #[test]
    fn test_overrides_win() {
        let mut args = args();
        args.workers = Some(2);
        args.dest = Some(PathBuf::from("/out"));
        args.temp = Some(PathBuf::from("/scratch"));

        let config = args.apply(TransferConfig::new("/srv"));

        assert_eq!(config.workers, 2);
        assert_eq!(config.destination_dir, PathBuf::from("/out"));
        assert_eq!(config.temp_dir, PathBuf::from("/scratch"));
    }
}
