//! Logging setup.
//!
//! Log output goes to a file through a non-blocking appender so that slow
//! disks never stall transfer threads. The level comes from `RUST_LOG` when
//! set, otherwise `info` (or `debug` when verbose).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

/// Keeps the background log writer alive. Buffered lines are flushed on drop.
#[must_use = "dropping the guard stops log output"]
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Default log directory: `<local data dir>/splitget/logs`.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("splitget")
        .join("logs")
}

/// Install the global subscriber writing to `log_dir/file_name`.
///
/// Fails if the directory cannot be created or a subscriber is already set.
pub fn init_logging(log_dir: &Path, file_name: &str, verbose: bool) -> io::Result<LoggingGuard> {
    fs::create_dir_all(log_dir)?;

    let appender = tracing_appender::rolling::never(log_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(timer)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    Ok(LoggingGuard { _guard: guard })
}
