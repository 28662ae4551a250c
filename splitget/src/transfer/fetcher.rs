//! Single-range fetcher.
//!
//! Streams one byte range from a [`RangeSource`] into its own file through a
//! fixed-size buffer, so memory use does not depend on the chunk size.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{ChunkFailure, ChunkTransferError};
use super::planner::ByteRange;
use super::source::RangeSource;

/// Buffer size for reading/writing chunk bodies (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// A range that was fetched completely into a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResult {
    /// The range this chunk covers.
    pub range: ByteRange,
    /// Temporary file holding the chunk bytes.
    pub path: PathBuf,
    /// Bytes written to `path`.
    pub bytes: u64,
}

/// Path of the intermediate file for a chunk of `target_name`.
pub fn chunk_path(temp_dir: &Path, target_name: &str, range: &ByteRange) -> PathBuf {
    temp_dir.join(format!("{}.part{}", target_name, range.start))
}

/// Fetches byte ranges of one URL.
pub struct ChunkFetcher<'a> {
    source: &'a dyn RangeSource,
    url: &'a str,
}

impl<'a> ChunkFetcher<'a> {
    pub fn new(source: &'a dyn RangeSource, url: &'a str) -> Self {
        Self { source, url }
    }

    /// Fetch `range` into `sink`, calling `on_progress` with the running byte
    /// count after every read.
    ///
    /// Does not retry; any failure is returned with the range attached.
    pub fn fetch(
        &self,
        range: ByteRange,
        sink: &Path,
        on_progress: &dyn Fn(u64),
    ) -> Result<ChunkResult, ChunkTransferError> {
        self.stream(&range, sink, on_progress)
            .map(|bytes| ChunkResult {
                range,
                path: sink.to_path_buf(),
                bytes,
            })
            .map_err(|cause| ChunkTransferError::new(range, cause))
    }

    fn stream(
        &self,
        range: &ByteRange,
        sink: &Path,
        on_progress: &dyn Fn(u64),
    ) -> Result<u64, ChunkFailure> {
        let body = self.source.open(self.url, range)?;
        let mut body: Box<dyn Read + Send> = match range.len() {
            Some(len) => Box::new(body.take(len)),
            None => body,
        };

        let write_failure = |source| ChunkFailure::Write {
            path: sink.to_path_buf(),
            source,
        };

        let file = File::create(sink).map_err(write_failure)?;
        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut received = 0u64;

        loop {
            let read = body.read(&mut buffer).map_err(ChunkFailure::Read)?;
            if read == 0 {
                break;
            }

            writer.write_all(&buffer[..read]).map_err(write_failure)?;
            received += read as u64;
            on_progress(received);
        }

        writer.flush().map_err(write_failure)?;

        if let Some(expected) = range.len() {
            if received != expected {
                return Err(ChunkFailure::ShortRead { expected, received });
            }
        }

        debug!(range = %range, bytes = received, path = %sink.display(), "chunk written");
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::testing::MemorySource;
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_chunk_path_uses_range_start() {
        let path = chunk_path(Path::new("/tmp/work"), "file.zip", &ByteRange::new(4096, 8191));
        assert_eq!(path, PathBuf::from("/tmp/work/file.zip.part4096"));
    }

    #[test]
    fn test_fetch_bounded_range() {
        let temp = TempDir::new().unwrap();
        let source = MemorySource::new((0..=255u8).collect());
        let fetcher = ChunkFetcher::new(&source, "http://example.com/data.bin");
        let sink = temp.path().join("data.bin.part16");

        let result = fetcher.fetch(ByteRange::new(16, 31), &sink, &|_| {}).unwrap();

        assert_eq!(result.bytes, 16);
        assert_eq!(result.path, sink);
        assert_eq!(fs::read(&sink).unwrap(), (16..=31u8).collect::<Vec<_>>());
    }

    #[test]
    fn test_fetch_unbounded_reads_everything() {
        let temp = TempDir::new().unwrap();
        let data = vec![7u8; 200_000];
        let source = MemorySource::new(data.clone());
        let fetcher = ChunkFetcher::new(&source, "http://example.com/big");
        let sink = temp.path().join("big");

        let result = fetcher.fetch(ByteRange::unbounded(), &sink, &|_| {}).unwrap();

        assert_eq!(result.bytes, data.len() as u64);
        assert_eq!(fs::read(&sink).unwrap(), data);
    }

    #[test]
    fn test_progress_is_reported_per_read() {
        let temp = TempDir::new().unwrap();
        let source = MemorySource::new(vec![1u8; 3 * BUFFER_SIZE]);
        let fetcher = ChunkFetcher::new(&source, "http://example.com/p");
        let last = Cell::new(0u64);
        let calls = Cell::new(0usize);

        fetcher
            .fetch(
                ByteRange::new(0, (3 * BUFFER_SIZE - 1) as u64),
                &temp.path().join("p.part0"),
                &|bytes| {
                    assert!(bytes >= last.get());
                    last.set(bytes);
                    calls.set(calls.get() + 1);
                },
            )
            .unwrap();

        assert_eq!(last.get(), (3 * BUFFER_SIZE) as u64);
        assert!(calls.get() >= 3);
    }

    #[test]
    fn test_short_body_is_an_error() {
        let temp = TempDir::new().unwrap();
        let source = MemorySource::new(vec![0u8; 10]);
        let fetcher = ChunkFetcher::new(&source, "http://example.com/short");

        let err = fetcher
            .fetch(ByteRange::new(5, 19), &temp.path().join("short.part5"), &|_| {})
            .unwrap_err();

        assert_eq!(err.range, ByteRange::new(5, 19));
        assert!(matches!(
            err.cause,
            ChunkFailure::ShortRead {
                expected: 15,
                received: 5
            }
        ));
    }

    #[test]
    fn test_source_failure_carries_range() {
        let temp = TempDir::new().unwrap();
        let source = MemorySource::new(vec![0u8; 100]).failing_at(50);
        let fetcher = ChunkFetcher::new(&source, "http://example.com/x");

        let err = fetcher
            .fetch(ByteRange::new(50, 99), &temp.path().join("x.part50"), &|_| {})
            .unwrap_err();

        assert_eq!(err.range.start, 50);
        assert!(matches!(err.cause, ChunkFailure::Status(500)));
    }
}
