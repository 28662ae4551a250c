//! splitget - parallel byte-range HTTP downloads with a download history
//!
//! This library fetches a single remote file by splitting it into byte
//! ranges, downloading the ranges concurrently, and stitching them back
//! together in order. Completed downloads are remembered in a CSV ledger so
//! that asking for the same URL again returns the earlier result without any
//! network traffic.
//!
//! ```no_run
//! use splitget::config::TransferConfig;
//! use splitget::downloader::Downloader;
//!
//! let config = TransferConfig::new("/srv/files").with_base_url("http://files.example.com/");
//! let downloader = Downloader::new(config)?;
//! let report = downloader.download("https://example.com/big.iso", None, None)?;
//! println!("{} -> {}", report.final_path.display(), report.published_url);
//! # Ok::<(), splitget::downloader::DownloadError>(())
//! ```

pub mod artifact;
pub mod config;
pub mod downloader;
pub mod ledger;
pub mod logging;
pub mod naming;
pub mod placement;
pub mod transfer;

pub use downloader::{DownloadError, DownloadReport, DownloadResult, Downloader};
