//! Parallel byte-range transfer engine.
//!
//! This module downloads one remote file by splitting it into byte ranges:
//! - Range planning (`planner`)
//! - HTTP access behind a testable trait (`source`)
//! - Streaming a single range to disk (`fetcher`)
//! - Bounded worker pool with all-or-nothing semantics (`coordinator`)
//! - Ordered concatenation of chunk files (`reassemble`)
//! - Lock-free progress aggregation (`progress`)
//!
//! # Architecture
//!
//! ```text
//! TransferEngine
//!         │
//!         ├── RangeSource (trait) ── ReqwestSource
//!         │
//!         ├── plan_ranges ──► [ByteRange; N]
//!         │
//!         ├── TransferCoordinator ──► ChunkFetcher × N (scoped threads)
//!         │           │
//!         │           └── ProgressCounters ──► ProgressReporter
//!         │
//!         └── merge ──► TransferOutcome
//! ```

mod coordinator;
mod engine;
mod error;
mod fetcher;
mod planner;
mod progress;
mod reassemble;
mod source;

pub use coordinator::TransferCoordinator;
pub use engine::{TransferEngine, TransferRequest};
pub use error::{ChunkFailure, ChunkTransferError, TransferError, TransferResult};
pub use fetcher::{chunk_path, ChunkFetcher, ChunkResult};
pub use planner::{plan_ranges, ByteRange};
pub use progress::{ProgressCounters, ProgressReporter, TransferProgressCallback};
pub use reassemble::{merge, TransferOutcome};
pub use source::{RangeBody, RangeSource, RemoteInfo, ReqwestSource};

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`RangeSource`] for unit tests.

    use std::io::{self, Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::{ByteRange, ChunkFailure, RangeBody, RangeSource, RemoteInfo, TransferResult};

    /// Serves a byte vector, counting requests and optionally failing.
    pub struct MemorySource {
        data: Vec<u8>,
        info: RemoteInfo,
        fail_at: Option<u64>,
        fail_times: Option<usize>,
        failures: AtomicUsize,
        read_delay: Option<Duration>,
        probes: AtomicUsize,
        range_requests: AtomicUsize,
        full_requests: AtomicUsize,
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl MemorySource {
        pub fn new(data: Vec<u8>) -> Self {
            let info = RemoteInfo {
                content_length: Some(data.len() as u64).filter(|&len| len > 0),
                accepts_ranges: true,
            };
            Self {
                data,
                info,
                fail_at: None,
                fail_times: None,
                failures: AtomicUsize::new(0),
                read_delay: None,
                probes: AtomicUsize::new(0),
                range_requests: AtomicUsize::new(0),
                full_requests: AtomicUsize::new(0),
                active: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn with_info(mut self, info: RemoteInfo) -> Self {
            self.info = info;
            self
        }

        /// Fail requests whose range starts at `start` with HTTP 500.
        pub fn failing_at(mut self, start: u64) -> Self {
            self.fail_at = Some(start);
            self
        }

        /// Only fail the first `times` matching requests.
        pub fn fail_times(mut self, times: usize) -> Self {
            self.fail_times = Some(times);
            self
        }

        pub fn with_read_delay_ms(mut self, ms: u64) -> Self {
            self.read_delay = Some(Duration::from_millis(ms));
            self
        }

        pub fn probes(&self) -> usize {
            self.probes.load(Ordering::SeqCst)
        }

        pub fn range_requests(&self) -> usize {
            self.range_requests.load(Ordering::SeqCst)
        }

        pub fn full_requests(&self) -> usize {
            self.full_requests.load(Ordering::SeqCst)
        }

        pub fn peak_concurrency(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }
    }

    impl RangeSource for MemorySource {
        fn probe(&self, _url: &str) -> TransferResult<RemoteInfo> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            Ok(self.info)
        }

        fn open(&self, _url: &str, range: &ByteRange) -> Result<RangeBody, ChunkFailure> {
            let counter = if range.is_unbounded() {
                &self.full_requests
            } else {
                &self.range_requests
            };
            counter.fetch_add(1, Ordering::SeqCst);

            if self.fail_at == Some(range.start) {
                let failed = self.failures.fetch_add(1, Ordering::SeqCst);
                if self.fail_times.map_or(true, |times| failed < times) {
                    return Err(ChunkFailure::Status(500));
                }
            }

            let len = self.data.len();
            let start = (range.start as usize).min(len);
            let end = match range.end {
                Some(end) => (end as usize + 1).min(len),
                None => len,
            };

            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(active, Ordering::SeqCst);

            Ok(Box::new(TrackedBody {
                inner: Cursor::new(self.data[start..end].to_vec()),
                delay: self.read_delay,
                active: Arc::clone(&self.active),
            }))
        }
    }

    struct TrackedBody {
        inner: Cursor<Vec<u8>>,
        delay: Option<Duration>,
        active: Arc<AtomicUsize>,
    }

    impl Read for TrackedBody {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if let Some(delay) = self.delay {
                thread::sleep(delay);
            }
            self.inner.read(buf)
        }
    }

    impl Drop for TrackedBody {
        fn drop(&mut self) {
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
