//! Bounded-concurrency coordination of chunk fetchers.
//!
//! A fixed pool of scoped worker threads pulls ranges from a shared cursor,
//! so at most `worker_limit` fetches run at once and queued ranges start as
//! soon as a worker frees up. The run is all-or-nothing: after the first
//! failure no new range is started, started ones are allowed to finish, and
//! every chunk file of the run is removed before the error is returned.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use tracing::{debug, info, warn};

use super::error::{ChunkTransferError, TransferError, TransferResult};
use super::fetcher::{chunk_path, ChunkFetcher, ChunkResult};
use super::planner::ByteRange;
use super::progress::ProgressCounters;
use super::source::RangeSource;

/// Runs chunk fetches on a bounded worker pool.
pub struct TransferCoordinator<'a> {
    source: &'a dyn RangeSource,
    worker_limit: usize,
    retries: u32,
}

impl<'a> TransferCoordinator<'a> {
    /// Create a coordinator running at most `worker_limit` fetches at once
    /// (minimum 1). Chunk failures are not retried.
    pub fn new(source: &'a dyn RangeSource, worker_limit: usize) -> Self {
        Self {
            source,
            worker_limit: worker_limit.max(1),
            retries: 0,
        }
    }

    /// Re-fetch a failed chunk up to `retries` more times before giving up.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Maximum number of concurrent fetches.
    pub fn worker_limit(&self) -> usize {
        self.worker_limit
    }

    /// Fetch every range of `url` into `temp_dir`.
    ///
    /// Returns the chunk results in the order of `ranges`, regardless of the
    /// order in which they completed.
    pub fn run(
        &self,
        url: &str,
        ranges: &[ByteRange],
        temp_dir: &Path,
        target_name: &str,
        counters: &ProgressCounters,
    ) -> TransferResult<Vec<ChunkResult>> {
        let workers = self.worker_limit.min(ranges.len()).max(1);
        let cursor = AtomicUsize::new(0);
        let aborted = AtomicBool::new(false);
        let first_error: Mutex<Option<ChunkTransferError>> = Mutex::new(None);
        let results: Mutex<Vec<Option<ChunkResult>>> = Mutex::new(vec![None; ranges.len()]);

        info!(url, chunks = ranges.len(), workers, "starting parallel transfer");

        thread::scope(|scope| {
            for worker in 0..workers {
                let cursor = &cursor;
                let aborted = &aborted;
                let first_error = &first_error;
                let results = &results;

                scope.spawn(move || loop {
                    if aborted.load(Ordering::Acquire) {
                        break;
                    }

                    let index = cursor.fetch_add(1, Ordering::AcqRel);
                    let Some(range) = ranges.get(index).copied() else {
                        break;
                    };

                    debug!(worker, index, range = %range, "fetching chunk");
                    let sink = chunk_path(temp_dir, target_name, &range);

                    match self.fetch_with_retries(url, range, &sink, index, counters) {
                        Ok(chunk) => {
                            counters.mark_completed(index, chunk.bytes);
                            results.lock().unwrap_or_else(PoisonError::into_inner)[index] =
                                Some(chunk);
                        }
                        Err(error) => {
                            warn!(worker, error = %error, "chunk failed, aborting transfer");
                            aborted.store(true, Ordering::Release);
                            first_error
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .get_or_insert(error);
                        }
                    }
                });
            }
        });

        if let Some(error) = first_error
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
        {
            remove_chunk_files(ranges, temp_dir, target_name);
            return Err(TransferError::Chunk(error));
        }

        // Without a recorded failure every range was fetched.
        let results = results.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok(results.into_iter().flatten().collect())
    }

    fn fetch_with_retries(
        &self,
        url: &str,
        range: ByteRange,
        sink: &Path,
        index: usize,
        counters: &ProgressCounters,
    ) -> Result<ChunkResult, ChunkTransferError> {
        let fetcher = ChunkFetcher::new(self.source, url);
        let mut attempt = 0;

        loop {
            let result = fetcher.fetch(range, sink, &|bytes| counters.update_chunk(index, bytes));

            match result {
                Err(error) if attempt < self.retries => {
                    attempt += 1;
                    warn!(range = %range, attempt, error = %error, "retrying chunk");
                    counters.update_chunk(index, 0);
                }
                other => return other,
            }
        }
    }
}

fn remove_chunk_files(ranges: &[ByteRange], temp_dir: &Path, target_name: &str) {
    for range in ranges {
        let path = chunk_path(temp_dir, target_name, range);
        if path.exists() {
            fs::remove_file(&path).ok();
        }
    }
}
