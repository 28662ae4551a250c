//! Helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use splitget::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config file to use: the `--config` flag, else the default location.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path.unwrap_or_else(config_file_path)
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<ConfigFile, CliError> {
    Ok(ConfigFile::load_from(path)?)
}
