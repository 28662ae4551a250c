//! Byte-range planning.
//!
//! Splits a remote resource of known size into contiguous, non-overlapping
//! inclusive ranges, one per worker. When the size is unknown the plan is a
//! single unbounded range and the transfer runs as one sequential stream.

use std::fmt;

/// An inclusive byte range into the remote resource.
///
/// `end == None` means "until the end of the body" and is only produced when
/// the total size is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    /// Create a bounded range covering `start..=end`.
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// The open-ended range used for single-stream transfers.
    pub fn unbounded() -> Self {
        Self {
            start: 0,
            end: None,
        }
    }

    /// Returns true if this range has no known end.
    pub fn is_unbounded(&self) -> bool {
        self.end.is_none()
    }

    /// Number of bytes covered, if bounded.
    pub fn len(&self) -> Option<u64> {
        self.end.map(|end| end - self.start + 1)
    }

    /// Value for the HTTP `Range` header, or `None` for an unranged request.
    pub fn header_value(&self) -> Option<String> {
        self.end.map(|end| format!("bytes={}-{}", self.start, end))
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "bytes={}-{}", self.start, end),
            None => write!(f, "bytes={}-", self.start),
        }
    }
}

/// Plan the ranges for a transfer.
///
/// * Unknown or zero size: one unbounded range.
/// * Otherwise `worker_count` ranges of `total_size / worker_count` bytes,
///   the last one absorbing the remainder.
/// * If that would yield empty ranges (`total_size < worker_count`), the plan
///   collapses to a single range over the whole resource.
pub fn plan_ranges(total_size: Option<u64>, worker_count: usize) -> Vec<ByteRange> {
    let total_size = match total_size {
        Some(size) if size > 0 => size,
        _ => return vec![ByteRange::unbounded()],
    };

    let workers = worker_count.max(1) as u64;
    let chunk_size = total_size / workers;

    if chunk_size == 0 {
        return vec![ByteRange::new(0, total_size - 1)];
    }

    (0..workers)
        .map(|i| {
            let start = i * chunk_size;
            let end = if i == workers - 1 {
                total_size - 1
            } else {
                start + chunk_size - 1
            };
            ByteRange::new(start, end)
        })
        .collect()
}
