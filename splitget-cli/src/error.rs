//! CLI error type.

use splitget::config::ConfigError;
use splitget::ledger::LedgerError;
use splitget::DownloadError;

/// Errors surfaced to the user by the `splitget` binary.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded, parsed, or saved.
    Config(String),

    /// The download itself failed.
    Download(DownloadError),

    /// The history ledger could not be read or updated.
    History(LedgerError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Download(e) => write!(f, "download failed: {}", e),
            Self::History(e) => write!(f, "history error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Download(e) => Some(e),
            Self::History(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<DownloadError> for CliError {
    fn from(e: DownloadError) -> Self {
        Self::Download(e)
    }
}

impl From<LedgerError> for CliError {
    fn from(e: LedgerError) -> Self {
        Self::History(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err: CliError = ConfigError::UnknownKey("download.colour".to_string()).into();
        assert_eq!(
            err.to_string(),
            "configuration error: unknown configuration key 'download.colour'"
        );
    }
}
