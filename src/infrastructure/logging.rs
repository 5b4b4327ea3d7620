use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::{DomainError, LoggingConfig};

/// Load the logging configuration, falling back to warnings-only defaults
/// when the file is missing or invalid.
///
/// The returned message describes why the fallback was used; it can only be
/// logged once [`init_logging`] has run.
pub fn load_logging_config(path: &Path) -> (LoggingConfig, Option<String>) {
    match LoggingConfig::load(path) {
        Ok(config) => (config, None),
        Err(e) => (
            LoggingConfig::fallback(),
            Some(format!(
                "Failed to load logging configuration {}: {}, falling back to warnings only",
                path.display(),
                e
            )),
        ),
    }
}

/// Initialize the logging system with console output and file rotation.
///
/// Returns a guard that must be kept alive for the duration of the application.
/// When the guard is dropped, any remaining logs are flushed.
pub fn init_logging(
    logs_dir: &Path,
    config: &LoggingConfig,
) -> Result<Option<WorkerGuard>, DomainError> {
    let level = config.level.as_str();

    if config.file_logging {
        fs::create_dir_all(logs_dir)?;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("splasher={},warn", level)));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(env_filter);

    if config.file_logging {
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("splasher")
            .filename_suffix("log")
            .max_log_files(config.max_files.max(1))
            .build(logs_dir)
            .map_err(|e| DomainError::Config(format!("Failed to create log file appender: {}", e)))?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(EnvFilter::new(format!("splasher={}", level)));

        // try_init: a second initialization must not panic
        if tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .is_ok()
        {
            tracing::info!(
                logs_dir = ?logs_dir,
                level = level,
                "Logging initialized with file output"
            );
        }

        Ok(Some(guard))
    } else {
        let _ = tracing_subscriber::registry()
            .with(console_layer)
            .try_init();

        tracing::info!(level = level, "Logging initialized (console only)");

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_logging_file_falls_back_to_warn() {
        let dir = tempfile::tempdir().unwrap();
        let (config, fallback) = load_logging_config(&dir.path().join("logging.toml"));
        assert_eq!(config, LoggingConfig::fallback());
        assert!(fallback.unwrap().contains("logging.toml"));
    }

    #[test]
    fn test_valid_logging_file_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logging.toml");
        fs::write(&path, "level = \"debug\"\nmax_files = 3\n").unwrap();

        let (config, fallback) = load_logging_config(&path);
        assert_eq!(config.level, "debug");
        assert_eq!(config.max_files, 3);
        assert!(fallback.is_none());
    }

    #[test]
    fn test_invalid_logging_file_falls_back_to_warn() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logging.toml");
        fs::write(&path, "file_logging = \"sometimes\"").unwrap();

        let (config, fallback) = load_logging_config(&path);
        assert_eq!(config.level, "warn");
        assert!(fallback.unwrap().contains("logging.toml"));
    }

    #[test]
    fn test_logging_initialization_creates_logs_dir() {
        // The global subscriber can only be installed once per test binary,
        // so only the side effects on disk are checked here.
        let dir = tempfile::tempdir().unwrap();
        let logs_dir = dir.path().join("logs");
        let config = LoggingConfig {
            level: "debug".to_string(),
            file_logging: true,
            max_files: 2,
        };

        let guard = init_logging(&logs_dir, &config).unwrap();
        assert!(guard.is_some());
        assert!(logs_dir.is_dir());
    }
}
