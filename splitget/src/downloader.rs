//! End-to-end download service.
//!
//! [`Downloader::download`] is the single entry point used by the CLI:
//!
//! 1. Ask the history ledger; a valid record short-circuits everything.
//! 2. Resolve the target name and run the parallel transfer.
//! 3. Move the artifact to the destination directory.
//! 4. Render the side artifact for the published URL.
//! 5. Remember the result in the ledger.
//!
//! Ledger, placement, and rendering failures are logged and do not fail an
//! otherwise successful transfer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::artifact::{NoSideArtifact, SideArtifactRenderer};
use crate::config::TransferConfig;
use crate::ledger::{HistoryLedger, HistoryRecord};
use crate::naming::{published_url, resolve_target_name};
use crate::placement::{DirectoryPlacement, Placement};
use crate::transfer::{
    RangeSource, ReqwestSource, TransferEngine, TransferError, TransferProgressCallback,
    TransferRequest,
};

/// Result type for [`Downloader`] operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// A download that could not produce an artifact.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// What a download produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Where the artifact lives now.
    pub final_path: PathBuf,
    /// Public URL for the artifact.
    pub published_url: String,
    /// Companion file, if one was rendered.
    pub side_artifact: Option<PathBuf>,
    /// Size of the artifact in bytes.
    pub bytes: u64,
    /// Whether the result came from the history ledger without any transfer.
    pub from_history: bool,
}

/// Downloads files and remembers where they went.
pub struct Downloader {
    config: TransferConfig,
    engine: TransferEngine,
    ledger: HistoryLedger,
    placement: Box<dyn Placement>,
    renderer: Box<dyn SideArtifactRenderer>,
}

impl Downloader {
    /// Create a downloader talking HTTP through reqwest.
    pub fn new(config: TransferConfig) -> DownloadResult<Self> {
        let source = ReqwestSource::new(config.timeout)?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Create a downloader over an arbitrary [`RangeSource`].
    pub fn with_source(config: TransferConfig, source: Arc<dyn RangeSource>) -> Self {
        let engine = TransferEngine::new(source).with_retries(config.retries);
        let ledger = HistoryLedger::new(&config.history_file);
        let placement = Box::new(DirectoryPlacement::new(&config.destination_dir));

        Self {
            config,
            engine,
            ledger,
            placement,
            renderer: Box::new(NoSideArtifact),
        }
    }

    /// Replace the placement strategy.
    pub fn with_placement(mut self, placement: Box<dyn Placement>) -> Self {
        self.placement = placement;
        self
    }

    /// Replace the side-artifact renderer.
    pub fn with_renderer(mut self, renderer: Box<dyn SideArtifactRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    /// Download `url`, or return the remembered result of a previous download.
    ///
    /// `name` overrides the file name taken from the URL. `on_progress` is
    /// called periodically while bytes are transferred.
    pub fn download(
        &self,
        url: &str,
        name: Option<&str>,
        on_progress: Option<TransferProgressCallback>,
    ) -> DownloadResult<DownloadReport> {
        if let Some(report) = self.from_history(url) {
            return Ok(report);
        }

        let target_name = resolve_target_name(url, name);
        info!(url, target = %target_name, workers = self.config.workers, "starting download");

        let request = TransferRequest::new(url, &target_name, self.config.workers);
        let outcome = self
            .engine
            .transfer(&request, &self.config.temp_dir, on_progress)?;

        let final_path = match self.placement.place(&outcome.path) {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, path = %outcome.path.display(), "placement failed, keeping artifact in temp dir");
                outcome.path.clone()
            }
        };

        let published = published_url(&self.config.base_url, &target_name);
        let side_artifact = self.render_side_artifact(&published, &target_name, &final_path);

        let mut record = HistoryRecord::new(url, &target_name, &final_path)
            .with_published_url(&published);
        if let Some(path) = &side_artifact {
            record = record.with_side_artifact(path.display().to_string());
        }
        if let Err(e) = self.ledger.record(url, record) {
            warn!(error = %e, url, "failed to record download history");
        }

        info!(url, path = %final_path.display(), bytes = outcome.bytes, "download complete");
        Ok(DownloadReport {
            final_path,
            published_url: published,
            side_artifact,
            bytes: outcome.bytes,
            from_history: false,
        })
    }

    fn from_history(&self, url: &str) -> Option<DownloadReport> {
        let record = match self.ledger.lookup(url) {
            Ok(record) => record?,
            Err(e) => {
                warn!(error = %e, url, "history lookup failed, downloading again");
                return None;
            }
        };

        let published = if record.published_url.is_empty() {
            let file_name = record
                .final_path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| record.target_name.clone());
            published_url(&self.config.base_url, &file_name)
        } else {
            record.published_url.clone()
        };

        let bytes = std::fs::metadata(record.final_path())
            .map(|m| m.len())
            .unwrap_or(0);

        info!(url, path = %record.final_path().display(), "already downloaded, skipping transfer");
        Some(DownloadReport {
            final_path: record.final_path.clone(),
            published_url: published,
            side_artifact: record.side_artifact().map(PathBuf::from),
            bytes,
            from_history: true,
        })
    }

    fn render_side_artifact(
        &self,
        published: &str,
        target_name: &str,
        final_path: &Path,
    ) -> Option<PathBuf> {
        let dest_dir = final_path.parent().unwrap_or_else(|| Path::new("."));
        match self.renderer.render(published, target_name, dest_dir) {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "side artifact rendering failed");
                None
            }
        }
    }
}
