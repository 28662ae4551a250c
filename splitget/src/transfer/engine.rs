//! End-to-end transfer of one remote file into the working directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::coordinator::TransferCoordinator;
use super::error::{TransferError, TransferResult};
use super::fetcher::ChunkFetcher;
use super::planner::{plan_ranges, ByteRange};
use super::progress::{ProgressCounters, ProgressReporter, TransferProgressCallback};
use super::reassemble::{merge, TransferOutcome};
use super::source::RangeSource;

/// One download invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Source URL, also the history key.
    pub url: String,
    /// File name for the merged artifact.
    pub target_name: String,
    /// Number of ranges (and concurrent workers).
    pub workers: usize,
}

impl TransferRequest {
    pub fn new(url: impl Into<String>, target_name: impl Into<String>, workers: usize) -> Self {
        Self {
            url: url.into(),
            target_name: target_name.into(),
            workers: workers.max(1),
        }
    }
}

/// Probes, plans, fetches, and merges a single remote file.
pub struct TransferEngine {
    source: Arc<dyn RangeSource>,
    retries: u32,
}

impl TransferEngine {
    /// Create an engine without chunk retries.
    pub fn new(source: Arc<dyn RangeSource>) -> Self {
        Self { source, retries: 0 }
    }

    /// Allow up to `retries` re-fetches per failed chunk.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// The underlying source.
    pub fn source(&self) -> &Arc<dyn RangeSource> {
        &self.source
    }

    /// Transfer `request` into `temp_dir` and return the merged artifact.
    ///
    /// A resource of unknown size is fetched with a single unranged request
    /// straight into `temp_dir/target_name`; otherwise it is split into ranges,
    /// fetched concurrently, and merged in order.
    pub fn transfer(
        &self,
        request: &TransferRequest,
        temp_dir: &Path,
        on_progress: Option<TransferProgressCallback>,
    ) -> TransferResult<TransferOutcome> {
        fs::create_dir_all(temp_dir).map_err(|e| TransferError::CreateDir {
            path: temp_dir.to_path_buf(),
            source: e,
        })?;

        let info = self.source.probe(&request.url)?;

        let ranges = match info.content_length {
            None => {
                info!(url = %request.url, "size unknown, using single-stream transfer");
                vec![ByteRange::unbounded()]
            }
            Some(size) if !info.accepts_ranges => {
                info!(url = %request.url, size, "server does not advertise byte ranges, using one range");
                plan_ranges(Some(size), 1)
            }
            Some(size) => plan_ranges(Some(size), request.workers),
        };

        let counters = Arc::new(ProgressCounters::new(ranges.len()));
        let _reporter = on_progress.map(|callback| {
            ProgressReporter::start_default(Arc::clone(&counters), info.content_length, callback)
        });

        if ranges.len() == 1 && ranges[0].is_unbounded() {
            return self.single_stream(request, temp_dir, &counters);
        }

        let chunks = TransferCoordinator::new(self.source.as_ref(), request.workers)
            .with_retries(self.retries)
            .run(
                &request.url,
                &ranges,
                temp_dir,
                &request.target_name,
                &counters,
            )?;

        merge(chunks, temp_dir, &request.target_name)
    }

    fn single_stream(
        &self,
        request: &TransferRequest,
        temp_dir: &Path,
        counters: &ProgressCounters,
    ) -> TransferResult<TransferOutcome> {
        let path = temp_dir.join(&request.target_name);
        let fetcher = ChunkFetcher::new(self.source.as_ref(), &request.url);

        let chunk = match fetcher.fetch(ByteRange::unbounded(), &path, &|bytes| {
            counters.update_chunk(0, bytes)
        }) {
            Ok(chunk) => chunk,
            Err(error) => {
                fs::remove_file(&path).ok();
                return Err(error.into());
            }
        };
        counters.mark_completed(0, chunk.bytes);

        info!(path = %chunk.path.display(), bytes = chunk.bytes, "single-stream transfer complete");
        Ok(TransferOutcome {
            path: chunk.path,
            bytes: chunk.bytes,
        })
    }
}
