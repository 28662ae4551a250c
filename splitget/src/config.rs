//! Configuration for the downloader.
//!
//! [`TransferConfig`] is the runtime value handed to the
//! [`Downloader`](crate::downloader::Downloader). It is normally produced from
//! a [`ConfigFile`], an INI file with two sections:
//!
//! ```ini
//! [download]
//! base_url = http://files.example.com/
//! workers = 5
//! timeout = 0
//! retries = 0
//!
//! [paths]
//! destination_dir = /srv/files
//! temp_dir = temp
//! history_file = history.csv
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

/// Default number of concurrent range workers.
pub const DEFAULT_WORKERS: usize = 5;

/// Default working directory for chunk files.
pub const DEFAULT_TEMP_DIR: &str = "temp";

/// Default history ledger file.
pub const DEFAULT_HISTORY_FILE: &str = "history.csv";

const DOWNLOAD_SECTION: &str = "download";
const PATHS_SECTION: &str = "paths";

/// Runtime configuration for a [`Downloader`](crate::downloader::Downloader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Prefix of the published URL; the target file name is appended verbatim.
    pub base_url: String,

    /// Number of byte ranges fetched concurrently.
    pub workers: usize,

    /// Directory the finished artifact is moved into.
    pub destination_dir: PathBuf,

    /// Directory for chunk files and the merged artifact before placement.
    pub temp_dir: PathBuf,

    /// Location of the history ledger.
    pub history_file: PathBuf,

    /// Per-request HTTP timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,

    /// How many times a failed chunk is re-fetched before the transfer fails.
    pub retries: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            workers: DEFAULT_WORKERS,
            destination_dir: PathBuf::from("."),
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            timeout: None,
            retries: 0,
        }
    }
}

impl TransferConfig {
    /// Create a configuration placing artifacts in `destination_dir`.
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            ..Default::default()
        }
    }

    /// Set the published URL prefix.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the worker count. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the working directory.
    pub fn with_temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = path.into();
        self
    }

    /// Set the history ledger location.
    pub fn with_history_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_file = path.into();
        self
    }

    /// Bound every HTTP request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Allow up to `retries` re-fetches per chunk.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

/// Errors loading, saving, or editing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("failed to write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    pub base_url: String,
    pub workers: usize,
    /// Seconds; zero disables the timeout.
    pub timeout_secs: u64,
    pub retries: u32,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            workers: DEFAULT_WORKERS,
            timeout_secs: 0,
            retries: 0,
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSettings {
    pub destination_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub history_file: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            destination_dir: PathBuf::from("."),
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
        }
    }
}

/// Contents of the INI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub download: DownloadSettings,
    pub paths: PathSettings,
}

impl ConfigFile {
    /// Load from the default location, see [`config_file_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields the defaults; unknown keys are
    /// ignored.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value.trim())?;
            }
        }

        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Write every key to `path`, creating the parent directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }

        ini.write_to_file(path).map_err(write_error)
    }

    /// Runtime configuration described by this file.
    pub fn transfer_config(&self) -> TransferConfig {
        let mut config = TransferConfig::new(&self.paths.destination_dir)
            .with_base_url(&self.download.base_url)
            .with_workers(self.download.workers)
            .with_temp_dir(&self.paths.temp_dir)
            .with_history_file(&self.paths.history_file)
            .with_retries(self.download.retries);
        if self.download.timeout_secs > 0 {
            config = config.with_timeout(Duration::from_secs(self.download.timeout_secs));
        }
        config
    }
}

/// Default configuration file: `<config dir>/splitget/config.ini`.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("splitget")
        .join("config.ini")
}

/// A single setting addressable as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    DownloadBaseUrl,
    DownloadWorkers,
    DownloadTimeout,
    DownloadRetries,
    PathsDestinationDir,
    PathsTempDir,
    PathsHistoryFile,
}

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::DownloadBaseUrl,
            ConfigKey::DownloadWorkers,
            ConfigKey::DownloadTimeout,
            ConfigKey::DownloadRetries,
            ConfigKey::PathsDestinationDir,
            ConfigKey::PathsTempDir,
            ConfigKey::PathsHistoryFile,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::DownloadBaseUrl
            | ConfigKey::DownloadWorkers
            | ConfigKey::DownloadTimeout
            | ConfigKey::DownloadRetries => DOWNLOAD_SECTION,
            ConfigKey::PathsDestinationDir
            | ConfigKey::PathsTempDir
            | ConfigKey::PathsHistoryFile => PATHS_SECTION,
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::DownloadBaseUrl => "base_url",
            ConfigKey::DownloadWorkers => "workers",
            ConfigKey::DownloadTimeout => "timeout",
            ConfigKey::DownloadRetries => "retries",
            ConfigKey::PathsDestinationDir => "destination_dir",
            ConfigKey::PathsTempDir => "temp_dir",
            ConfigKey::PathsHistoryFile => "history_file",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::DownloadBaseUrl => config.download.base_url.clone(),
            ConfigKey::DownloadWorkers => config.download.workers.to_string(),
            ConfigKey::DownloadTimeout => config.download.timeout_secs.to_string(),
            ConfigKey::DownloadRetries => config.download.retries.to_string(),
            ConfigKey::PathsDestinationDir => config.paths.destination_dir.display().to_string(),
            ConfigKey::PathsTempDir => config.paths.temp_dir.display().to_string(),
            ConfigKey::PathsHistoryFile => config.paths.history_file.display().to_string(),
        }
    }

    /// Parse and store `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        match self {
            ConfigKey::DownloadBaseUrl => config.download.base_url = value.to_string(),
            ConfigKey::DownloadWorkers => {
                let workers: usize = self.parse_number(value)?;
                if workers == 0 {
                    return Err(self.invalid(value, "must be at least 1"));
                }
                config.download.workers = workers;
            }
            ConfigKey::DownloadTimeout => config.download.timeout_secs = self.parse_number(value)?,
            ConfigKey::DownloadRetries => config.download.retries = self.parse_number(value)?,
            ConfigKey::PathsDestinationDir => {
                config.paths.destination_dir = self.parse_path(value)?
            }
            ConfigKey::PathsTempDir => config.paths.temp_dir = self.parse_path(value)?,
            ConfigKey::PathsHistoryFile => config.paths.history_file = self.parse_path(value)?,
        }
        Ok(())
    }

    fn parse_number<T>(&self, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        value
            .parse()
            .map_err(|e: T::Err| self.invalid(value, &e.to_string()))
    }

    fn parse_path(&self, value: &str) -> Result<PathBuf, ConfigError> {
        if value.is_empty() {
            return Err(self.invalid(value, "path must not be empty"));
        }
        Ok(PathBuf::from(value))
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
