//! HTTP source abstraction for testability.
//!
//! The transfer engine never talks to reqwest directly; it goes through
//! [`RangeSource`], which lets tests substitute an in-memory resource.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, RANGE};
use reqwest::StatusCode;
use tracing::{debug, warn};

use super::error::{ChunkFailure, TransferError, TransferResult};
use super::planner::ByteRange;

/// What the size probe learned about the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteInfo {
    /// Total size in bytes, if the server reported a non-zero length.
    pub content_length: Option<u64>,
    /// Whether the server advertised `Accept-Ranges: bytes`.
    pub accepts_ranges: bool,
}

/// Readable response body for one range.
pub type RangeBody = Box<dyn Read + Send>;

/// A remote resource that can be probed and read by byte range.
pub trait RangeSource: Send + Sync {
    /// Discover the total size and range support (a `HEAD` request over HTTP).
    fn probe(&self, url: &str) -> TransferResult<RemoteInfo>;

    /// Open a streaming body for `range`. Unbounded ranges issue a plain `GET`.
    fn open(&self, url: &str, range: &ByteRange) -> Result<RangeBody, ChunkFailure>;
}

/// Blocking reqwest implementation of [`RangeSource`].
#[derive(Debug, Clone)]
pub struct ReqwestSource {
    client: Client,
    timeout: Option<Duration>,
}

impl ReqwestSource {
    /// Create a source. `None` disables request timeouts entirely.
    pub fn new(timeout: Option<Duration>) -> TransferResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransferError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// The configured per-request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn request_failure(&self, error: reqwest::Error) -> ChunkFailure {
        match self.timeout {
            Some(timeout) if error.is_timeout() => ChunkFailure::Timeout(timeout.as_secs()),
            _ => ChunkFailure::Request(error.to_string()),
        }
    }
}

impl RangeSource for ReqwestSource {
    fn probe(&self, url: &str) -> TransferResult<RemoteInfo> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|e| TransferError::Probe {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            warn!(url, status = %response.status(), "HEAD request not successful, size unknown");
            return Ok(RemoteInfo::default());
        }

        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&len| len > 0);

        let accepts_ranges = response
            .headers()
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("bytes"))
            .unwrap_or(false);

        debug!(url, ?content_length, accepts_ranges, "probed remote resource");

        Ok(RemoteInfo {
            content_length,
            accepts_ranges,
        })
    }

    fn open(&self, url: &str, range: &ByteRange) -> Result<RangeBody, ChunkFailure> {
        let mut request = self.client.get(url);
        if let Some(value) = range.header_value() {
            request = request.header(RANGE, value);
        }

        let response = request.send().map_err(|e| self.request_failure(e))?;
        let status = response.status();

        let acceptable = if range.is_unbounded() {
            status.is_success()
        } else {
            // A 200 is only usable when the range begins at the first byte:
            // the leading bytes of the full body are then the requested ones.
            status == StatusCode::PARTIAL_CONTENT || (status == StatusCode::OK && range.start == 0)
        };

        if !acceptable {
            return Err(ChunkFailure::Status(status.as_u16()));
        }

        Ok(Box::new(response))
    }
}
