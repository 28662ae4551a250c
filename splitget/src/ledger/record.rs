//! History record type.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Timestamp format stored in the `download_time` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One completed download, keyed by its source URL.
///
/// Column names match the on-disk CSV header. The last two columns were added
/// later; rows written before that deserialize with empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Source URL; unique within the ledger.
    #[serde(rename = "url")]
    pub source: String,

    /// Target file name the download was saved as.
    #[serde(rename = "filename")]
    pub target_name: String,

    /// Local completion time, formatted with [`TIMESTAMP_FORMAT`].
    #[serde(rename = "download_time")]
    pub completed_at: String,

    /// Where the artifact was placed.
    #[serde(rename = "file_path")]
    pub final_path: PathBuf,

    /// Public URL the artifact is served from.
    #[serde(rename = "download_url", default)]
    pub published_url: String,

    /// Path of the side artifact, empty if none was produced.
    #[serde(rename = "qrcode_path", default)]
    pub side_artifact_path: String,
}

impl HistoryRecord {
    /// Create a record stamped with the current local time.
    pub fn new(
        source: impl Into<String>,
        target_name: impl Into<String>,
        final_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            target_name: target_name.into(),
            completed_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            final_path: final_path.into(),
            published_url: String::new(),
            side_artifact_path: String::new(),
        }
    }

    /// Set the published URL (builder pattern).
    pub fn with_published_url(mut self, url: impl Into<String>) -> Self {
        self.published_url = url.into();
        self
    }

    /// Set the side-artifact path (builder pattern).
    pub fn with_side_artifact(mut self, path: impl Into<String>) -> Self {
        self.side_artifact_path = path.into();
        self
    }

    /// Path of the placed artifact.
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// A record is only valid while its artifact exists.
    pub fn is_backed(&self) -> bool {
        self.final_path.exists()
    }

    /// Side-artifact path, if one was recorded.
    pub fn side_artifact(&self) -> Option<&str> {
        Some(self.side_artifact_path.as_str()).filter(|p| !p.is_empty())
    }
}
