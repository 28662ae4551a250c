//! Progress aggregation for parallel chunk transfers.
//!
//! Each chunk owns one atomic slot; fetchers store their running byte count
//! after every read, and a reporter thread periodically sums the slots and
//! forwards the total to a caller-supplied callback.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Progress callback for a transfer.
///
/// # Arguments
///
/// * `bytes_transferred` - Bytes received across all chunks
/// * `total_bytes` - Size of the resource, if known
/// * `chunks_completed` - Chunks fully written
/// * `total_chunks` - Number of planned chunks
pub type TransferProgressCallback = Box<dyn Fn(u64, Option<u64>, usize, usize) + Send + Sync>;

/// Default interval between progress reports.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared, lock-free counters updated concurrently by chunk fetchers.
#[derive(Debug)]
pub struct ProgressCounters {
    chunk_bytes: Vec<AtomicU64>,
    chunks_completed: AtomicUsize,
    done: AtomicBool,
}

impl ProgressCounters {
    /// Create counters for `num_chunks` chunks.
    pub fn new(num_chunks: usize) -> Self {
        Self {
            chunk_bytes: (0..num_chunks).map(|_| AtomicU64::new(0)).collect(),
            chunks_completed: AtomicUsize::new(0),
            done: AtomicBool::new(false),
        }
    }

    /// Number of chunk slots.
    pub fn num_chunks(&self) -> usize {
        self.chunk_bytes.len()
    }

    /// Bytes received across all chunks.
    pub fn total_bytes(&self) -> u64 {
        self.chunk_bytes
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    /// Number of chunks that finished successfully.
    pub fn completed_chunks(&self) -> usize {
        self.chunks_completed.load(Ordering::Acquire)
    }

    /// Store the running byte count for one chunk.
    pub fn update_chunk(&self, index: usize, bytes: u64) {
        if let Some(slot) = self.chunk_bytes.get(index) {
            slot.store(bytes, Ordering::Relaxed);
        }
    }

    /// Record a finished chunk with its final byte count.
    pub fn mark_completed(&self, index: usize, final_bytes: u64) {
        if let Some(slot) = self.chunk_bytes.get(index) {
            slot.store(final_bytes, Ordering::Relaxed);
            self.chunks_completed.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Signal the reporter that the transfer is over.
    pub fn signal_done(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// Whether [`signal_done`](Self::signal_done) has been called.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

/// Background thread forwarding aggregated progress to a callback.
///
/// Dropping the reporter stops it after one final report.
pub struct ProgressReporter {
    handle: Option<JoinHandle<()>>,
    counters: Arc<ProgressCounters>,
}

impl ProgressReporter {
    /// Start a reporter polling `counters` every `poll_interval`.
    pub fn start(
        counters: Arc<ProgressCounters>,
        total_size: Option<u64>,
        callback: TransferProgressCallback,
        poll_interval: Duration,
    ) -> Self {
        let polled = Arc::clone(&counters);
        let total_chunks = counters.num_chunks();

        let handle = thread::spawn(move || {
            let report = || {
                callback(
                    polled.total_bytes(),
                    total_size,
                    polled.completed_chunks(),
                    total_chunks,
                )
            };

            while !polled.is_done() {
                report();
                thread::sleep(poll_interval);
            }
            report();
        });

        Self {
            handle: Some(handle),
            counters,
        }
    }

    /// Start a reporter with the default poll interval.
    pub fn start_default(
        counters: Arc<ProgressCounters>,
        total_size: Option<u64>,
        callback: TransferProgressCallback,
    ) -> Self {
        Self::start(counters, total_size, callback, DEFAULT_POLL_INTERVAL)
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.counters.signal_done();
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_counters_start_empty() {
        let counters = ProgressCounters::new(3);
        assert_eq!(counters.num_chunks(), 3);
        assert_eq!(counters.total_bytes(), 0);
        assert_eq!(counters.completed_chunks(), 0);
        assert!(!counters.is_done());
    }

    #[test]
    fn test_update_and_complete() {
        let counters = ProgressCounters::new(2);
        counters.update_chunk(0, 500);
        counters.update_chunk(1, 300);
        assert_eq!(counters.total_bytes(), 800);

        counters.mark_completed(0, 1000);
        assert_eq!(counters.total_bytes(), 1300);
        assert_eq!(counters.completed_chunks(), 1);
    }

    #[test]
    fn test_out_of_range_index_is_ignored() {
        let counters = ProgressCounters::new(1);
        counters.update_chunk(5, 100);
        counters.mark_completed(5, 100);
        assert_eq!(counters.total_bytes(), 0);
        assert_eq!(counters.completed_chunks(), 0);
    }

    #[test]
    fn test_concurrent_updates_sum_correctly() {
        let counters = Arc::new(ProgressCounters::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let counters = Arc::clone(&counters);
                thread::spawn(move || {
                    for step in 1..=100u64 {
                        counters.update_chunk(i, step * 10);
                    }
                    counters.mark_completed(i, 1000);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counters.total_bytes(), 8000);
        assert_eq!(counters.completed_chunks(), 8);
    }

    #[test]
    fn test_reporter_delivers_final_report_on_drop() {
        let counters = Arc::new(ProgressCounters::new(2));
        let last = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&last);

        let reporter = ProgressReporter::start(
            Arc::clone(&counters),
            Some(2000),
            Box::new(move |bytes, total, done, chunks| {
                *seen.lock().unwrap() = Some((bytes, total, done, chunks));
            }),
            Duration::from_millis(5),
        );

        counters.mark_completed(0, 1000);
        counters.mark_completed(1, 1000);
        drop(reporter);

        assert_eq!(*last.lock().unwrap(), Some((2000, Some(2000), 2, 2)));
        assert!(counters.is_done());
    }
}
