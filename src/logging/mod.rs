//! Application logging functionality
//!
//! Sets up the tracing subscriber: stderr by default, or a daily log file
//! under ~/.config/bezy-glyphs/logs/

use crate::core::config::ConfigFile;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "bezy-glyphs.log";
const DEFAULT_LEVEL: &str = "info";

/// Get the path to the logs directory
pub fn logs_dir() -> PathBuf {
    ConfigFile::config_dir().join("logs")
}

/// Get the path to the current log file
pub fn current_log_file() -> PathBuf {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d");
    logs_dir().join(format!("{LOG_FILE_PREFIX}.{timestamp}"))
}

/// Initialize the logs directory
pub fn initialize_logs_directory() -> anyhow::Result<()> {
    fs::create_dir_all(logs_dir())?;
    Ok(())
}

/// RUST_LOG wins over the configured level
fn env_filter(level: Option<&str>) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(level.unwrap_or(DEFAULT_LEVEL))?),
    }
}

/// Install the global subscriber.
///
/// With `to_file` the output goes to the daily log file; keep the returned
/// guard alive until exit so buffered lines are flushed.
pub fn init(level: Option<&str>, to_file: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = env_filter(level)?;
    if to_file {
        initialize_logs_directory()?;
        let appender = tracing_appender::rolling::daily(logs_dir(), LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
        tracing::info!(
            "=== bezy-glyphs started at {} ===",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        Ok(Some(guard))
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_is_dated() {
        let file = current_log_file();
        assert!(file.starts_with(logs_dir()));
        let name = file.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("bezy-glyphs.log."));
        assert_eq!(name.len(), "bezy-glyphs.log.".len() + "2024-01-01".len());
    }

    #[test]
    fn test_invalid_level_is_an_error() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(env_filter(Some("bezy_glyphs=notalevel")).is_err());
            assert!(env_filter(None).is_ok());
        }
    }
}
