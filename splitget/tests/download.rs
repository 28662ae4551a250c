//! End-to-end tests for `Downloader` against an in-memory HTTP source.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use splitget::config::TransferConfig;
use splitget::transfer::{
    plan_ranges, ByteRange, ChunkFailure, RangeBody, RangeSource, RemoteInfo, TransferError,
    TransferResult,
};
use splitget::{DownloadError, Downloader};
use tempfile::TempDir;

/// Serves one body and records every request it sees.
struct FakeServer {
    body: Vec<u8>,
    info: RemoteInfo,
    fail_range_start: Option<u64>,
    requests: AtomicUsize,
    ranges: Mutex<Vec<ByteRange>>,
}

impl FakeServer {
    fn new(body: Vec<u8>) -> Self {
        let info = RemoteInfo {
            content_length: Some(body.len() as u64),
            accepts_ranges: true,
        };
        Self {
            body,
            info,
            fail_range_start: None,
            requests: AtomicUsize::new(0),
            ranges: Mutex::new(Vec::new()),
        }
    }

    fn without_length(mut self) -> Self {
        self.info = RemoteInfo::default();
        self
    }

    fn failing_range(mut self, start: u64) -> Self {
        self.fail_range_start = Some(start);
        self
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn ranges(&self) -> Vec<ByteRange> {
        let mut ranges = self.ranges.lock().unwrap().clone();
        ranges.sort_by_key(|r| r.start);
        ranges
    }
}

impl RangeSource for FakeServer {
    fn probe(&self, _url: &str) -> TransferResult<RemoteInfo> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.info)
    }

    fn open(&self, _url: &str, range: &ByteRange) -> Result<RangeBody, ChunkFailure> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.ranges.lock().unwrap().push(*range);

        if self.fail_range_start == Some(range.start) {
            return Err(ChunkFailure::Status(503));
        }

        let end = match range.end {
            Some(end) => end as usize + 1,
            None => self.body.len(),
        };
        Ok(Box::new(Cursor::new(
            self.body[range.start as usize..end].to_vec(),
        )))
    }
}

fn config(root: &Path, workers: usize) -> TransferConfig {
    TransferConfig::new(root.join("files"))
        .with_base_url("http://files.example.com/")
        .with_workers(workers)
        .with_temp_dir(root.join("temp"))
        .with_history_file(root.join("history.csv"))
}

fn body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 241) as u8 ^ (i >> 8) as u8).collect()
}

#[test]
fn test_one_million_bytes_four_workers() {
    let temp = TempDir::new().unwrap();
    let data = body(1_000_000);
    let server = Arc::new(FakeServer::new(data.clone()));
    let downloader = Downloader::with_source(config(temp.path(), 4), server.clone());

    let report = downloader
        .download("https://example.com/big.bin", None, None)
        .unwrap();

    assert_eq!(
        server.ranges(),
        vec![
            ByteRange::new(0, 249_999),
            ByteRange::new(250_000, 499_999),
            ByteRange::new(500_000, 749_999),
            ByteRange::new(750_000, 999_999),
        ]
    );
    assert_eq!(server.ranges(), plan_ranges(Some(1_000_000), 4));
    assert_eq!(fs::read(&report.final_path).unwrap(), data);
    assert_eq!(report.bytes, 1_000_000);

    // Only the merged artifact was ever left behind, and it has been moved.
    assert_eq!(fs::read_dir(temp.path().join("temp")).unwrap().count(), 0);
}

#[test]
fn test_repeat_request_makes_no_network_calls() {
    let temp = TempDir::new().unwrap();
    let server = Arc::new(FakeServer::new(body(20_000)));
    let downloader = Downloader::with_source(config(temp.path(), 3), server.clone());

    let first = downloader
        .download("https://example.com/a.zip", None, None)
        .unwrap();
    let after_first = server.requests();

    let second = downloader
        .download("https://example.com/a.zip", None, None)
        .unwrap();

    assert!(second.from_history);
    assert_eq!(second.final_path, first.final_path);
    assert_eq!(second.published_url, "http://files.example.com/a.zip");
    assert_eq!(server.requests(), after_first);
}

#[test]
fn test_one_failed_chunk_fails_the_request() {
    let temp = TempDir::new().unwrap();
    let server = Arc::new(FakeServer::new(body(4_000)).failing_range(2_000));
    let downloader = Downloader::with_source(config(temp.path(), 4), server);

    let err = downloader
        .download("https://example.com/broken.bin", None, None)
        .unwrap_err();

    assert!(matches!(
        err,
        DownloadError::Transfer(TransferError::Chunk(ref chunk)) if chunk.range.start == 2_000
    ));
    assert!(!temp.path().join("temp").join("broken.bin").exists());
    assert!(!temp.path().join("files").join("broken.bin").exists());
    assert!(downloader.ledger().entries().unwrap().is_empty());
}

#[test]
fn test_unknown_size_streams_single_request() {
    let temp = TempDir::new().unwrap();
    let data = body(70_000);
    let server = Arc::new(FakeServer::new(data.clone()).without_length());
    let downloader = Downloader::with_source(config(temp.path(), 5), server.clone());

    let report = downloader
        .download("https://example.com/stream", Some("stream.dat"), None)
        .unwrap();

    assert_eq!(server.ranges(), vec![ByteRange::unbounded()]);
    assert_eq!(server.requests(), 2);
    assert_eq!(fs::read(&report.final_path).unwrap(), data);
}

#[test]
fn test_deleted_file_triggers_fresh_download() {
    let temp = TempDir::new().unwrap();
    let server = Arc::new(FakeServer::new(body(9_000)));
    let downloader = Downloader::with_source(config(temp.path(), 2), server.clone());

    let first = downloader
        .download("https://example.com/r.bin", None, None)
        .unwrap();
    fs::remove_file(&first.final_path).unwrap();

    let second = downloader
        .download("https://example.com/r.bin", None, None)
        .unwrap();

    assert!(!second.from_history);
    assert_eq!(second.final_path, first.final_path);
    assert_eq!(server.ranges().len(), 4);
    assert_eq!(downloader.ledger().entries().unwrap().len(), 1);
}

#[test]
fn test_collisions_do_not_overwrite() {
    let temp = TempDir::new().unwrap();
    let server = Arc::new(FakeServer::new(body(1_000)));
    let downloader = Downloader::with_source(config(temp.path(), 2), server);

    let first = downloader
        .download("https://example.com/v1/pkg.tar", None, None)
        .unwrap();
    let second = downloader
        .download("https://example.com/v2/pkg.tar", None, None)
        .unwrap();

    assert_eq!(first.final_path, temp.path().join("files").join("pkg.tar"));
    assert_eq!(second.final_path, temp.path().join("files").join("pkg_1.tar"));
    assert_eq!(downloader.ledger().entries().unwrap().len(), 2);
}
