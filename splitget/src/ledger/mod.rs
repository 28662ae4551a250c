//! Download history ledger.
//!
//! Maps a source URL to the result of its last successful download so that a
//! repeated request is answered without touching the network. Records are
//! invalidated lazily: a lookup that finds a record whose file has gone
//! removes it and reports a miss.

mod error;
mod record;
mod store;

pub use error::{LedgerError, LedgerResult};
pub use record::{HistoryRecord, TIMESTAMP_FORMAT};
pub use store::{HistoryLedger, COLUMNS};
