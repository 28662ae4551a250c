//! Error types for chunked transfers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::planner::ByteRange;

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Why a single chunk could not be fetched.
#[derive(Debug, Error)]
pub enum ChunkFailure {
    /// The request could not be sent or the connection failed.
    #[error("request failed: {0}")]
    Request(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The server answered with a status that cannot carry the requested bytes.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Reading the response body failed.
    #[error("read error: {0}")]
    Read(#[source] io::Error),

    /// Writing the chunk to local storage failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The body ended before the range was complete.
    #[error("expected {expected} bytes, received {received}")]
    ShortRead { expected: u64, received: u64 },
}

/// A failed chunk, carrying the range it was responsible for.
#[derive(Debug, Error)]
#[error("chunk {range} failed: {cause}")]
pub struct ChunkTransferError {
    pub range: ByteRange,
    #[source]
    pub cause: ChunkFailure,
}

impl ChunkTransferError {
    pub fn new(range: ByteRange, cause: ChunkFailure) -> Self {
        Self { range, cause }
    }
}

/// Errors that abort a whole transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The size probe could not reach the server.
    #[error("failed to probe {url}: {reason}")]
    Probe { url: String, reason: String },

    /// One range failed; no partial result is kept.
    #[error(transparent)]
    Chunk(#[from] ChunkTransferError),

    /// Reading a chunk or writing the merged artifact failed.
    #[error("failed to merge chunks into {}: {source}", path.display())]
    Merge {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The working directory could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
