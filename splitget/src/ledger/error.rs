//! Ledger error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors reading or writing the history ledger.
///
/// These never abort a transfer; callers log them and carry on without
/// remembering the result.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Filesystem access to the ledger failed.
    #[error("ledger I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The ledger could not be parsed or serialized.
    #[error("malformed ledger {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The exclusive ledger lock could not be taken.
    #[error("failed to lock ledger {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
