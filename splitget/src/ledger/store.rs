//! CSV-backed history ledger.
//!
//! The whole table is rewritten on every change: rows go to a sibling
//! temporary file which is then renamed over the ledger, so readers only ever
//! see a complete snapshot. Each operation holds an exclusive advisory lock on
//! `<ledger>.lock` for its duration.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info, warn};

use super::error::{LedgerError, LedgerResult};
use super::record::HistoryRecord;

/// Column order of the ledger file.
pub const COLUMNS: [&str; 6] = [
    "url",
    "filename",
    "download_time",
    "file_path",
    "download_url",
    "qrcode_path",
];

/// Persistent mapping from source URL to the result of its last download.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    path: PathBuf,
}

/// Held for the duration of one ledger operation.
struct LedgerLock {
    file: File,
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl HistoryLedger {
    /// Open (lazily) the ledger at `path`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the record for `key`.
    ///
    /// A record whose artifact no longer exists is removed from the ledger and
    /// reported as absent.
    pub fn lookup(&self, key: &str) -> LedgerResult<Option<HistoryRecord>> {
        let _lock = self.lock()?;
        let mut table = self.read_table()?;

        let Some(position) = table.iter().position(|r| r.source == key) else {
            return Ok(None);
        };

        if table[position].is_backed() {
            return Ok(Some(table[position].clone()));
        }

        let stale = table.remove(position);
        info!(
            url = key,
            path = %stale.final_path.display(),
            "recorded file is gone, dropping history entry"
        );
        self.write_table(&table)?;
        Ok(None)
    }

    /// Insert or replace the record for `key`.
    ///
    /// The stored record's `source` is always `key`.
    pub fn record(&self, key: &str, mut record: HistoryRecord) -> LedgerResult<()> {
        record.source = key.to_string();

        let _lock = self.lock()?;
        let mut table = self.read_table()?;

        match table.iter_mut().find(|r| r.source == key) {
            Some(existing) => *existing = record,
            None => table.push(record),
        }

        self.write_table(&table)?;
        debug!(url = key, "history entry recorded");
        Ok(())
    }

    /// Remove the record for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &str) -> LedgerResult<bool> {
        let _lock = self.lock()?;
        let mut table = self.read_table()?;

        let before = table.len();
        table.retain(|r| r.source != key);
        if table.len() == before {
            return Ok(false);
        }

        self.write_table(&table)?;
        Ok(true)
    }

    /// All records, in insertion order.
    pub fn entries(&self) -> LedgerResult<Vec<HistoryRecord>> {
        let _lock = self.lock()?;
        self.read_table()
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("history"));
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn lock(&self) -> LedgerResult<LedgerLock> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }

        let lock_path = self.sibling(".lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| self.io_error(&lock_path, e))?;

        file.lock_exclusive().map_err(|e| LedgerError::Lock {
            path: lock_path,
            source: e,
        })?;

        Ok(LedgerLock { file })
    }

    fn read_table(&self) -> LedgerResult<Vec<HistoryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let format_error = |source| LedgerError::Format {
            path: self.path.clone(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(format_error)?;
        let headers = reader.headers().map_err(format_error)?.clone();

        let mut table: Vec<HistoryRecord> = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let line = index + 2;
            let mut row = match row {
                Ok(row) => row,
                Err(e) if e.is_io_error() => return Err(format_error(e)),
                Err(e) => {
                    warn!(path = %self.path.display(), line, error = %e, "skipping unreadable ledger row");
                    continue;
                }
            };

            // Rows from older versions lack the trailing columns.
            while row.len() < headers.len() {
                row.push_field("");
            }

            let record = match row.deserialize::<HistoryRecord>(Some(&headers)) {
                Ok(record) => record,
                Err(e) => {
                    warn!(path = %self.path.display(), line, error = %e, "skipping malformed ledger row");
                    continue;
                }
            };

            match table.iter_mut().find(|r| r.source == record.source) {
                Some(existing) => *existing = record,
                None => table.push(record),
            }
        }

        Ok(table)
    }

    fn write_table(&self, table: &[HistoryRecord]) -> LedgerResult<()> {
        let staging = self.sibling(".tmp");
        let format_error = |source| LedgerError::Format {
            path: staging.clone(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&staging)
            .map_err(format_error)?;

        writer.write_record(COLUMNS).map_err(format_error)?;
        for record in table {
            writer.serialize(record).map_err(format_error)?;
        }
        writer.flush().map_err(|e| self.io_error(&staging, e))?;
        drop(writer);

        fs::rename(&staging, &self.path).map_err(|e| self.io_error(&self.path, e))
    }
}
