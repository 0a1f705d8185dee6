//! Tracing subscriber setup for hosts embedding the navigator core.
//!
//! Interactive terminals get console output only. Otherwise events also go to
//! a daily `dolphin.*.log` file under the data directory, and a log directory
//! that cannot be created degrades to console output instead of failing.
//!
//! Filters are chosen from, in order: an explicit filter (usually from
//! [`NavigatorSettings::log_filter`]), `DOLPHIN_LOG`, `RUST_LOG`, and a
//! build-dependent default that keeps `mysql_async` quiet.

use crate::config::NavigatorSettings;

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Prefix of the rolling log files.
pub const LOG_FILE_PREFIX: &str = "dolphin";

/// Where and how the core logs.
pub struct LogConfig {
    /// Directory for the rolling log files
    pub log_dir: PathBuf,
    /// Console only, for interactive terminals
    pub is_pty: bool,
    /// Filter directive taking precedence over the environment
    pub log_filter: Option<String>,
}

impl LogConfig {
    /// Log into `log_dir`, detecting whether stdout is a terminal.
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir, is_pty: atty::is(atty::Stream::Stdout), log_filter: None }
    }

    /// Default log directory with the filter from `settings`, if any.
    pub fn from_settings(settings: &NavigatorSettings) -> Self {
        let config = Self::new(log_dir());
        match &settings.log_filter {
            Some(filter) => config.with_filter(filter.clone()),
            None => config,
        }
    }

    /// Override the environment's filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }
}

/// Keeps the file writer alive. Dropping it flushes buffered events.
pub struct LoggingGuard {
    file_dir: Option<PathBuf>,
    _worker: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// Get the directory log files are written to, if file output is active.
    pub fn file_dir(&self) -> Option<&Path> {
        self.file_dir.as_deref()
    }
}

/// Install the global subscriber described by `config`.
///
/// A subscriber installed earlier by the host is left in place; the file
/// writer is still returned so the host can decide what to do with it.
pub fn init_logging(config: LogConfig) -> LoggingGuard {
    let filter = config.log_filter.as_deref();
    if config.is_pty {
        install_console(filter);
        return LoggingGuard { file_dir: None, _worker: None };
    }

    match install_file_and_console(&config.log_dir, filter) {
        Ok(worker) => LoggingGuard { file_dir: Some(config.log_dir), _worker: Some(worker) },
        Err(e) => {
            // No subscriber yet, so this cannot go through tracing.
            eprintln!(
                "Warning: cannot log to {}: {e}. Logging to the console only.",
                config.log_dir.display()
            );
            install_console(filter);
            LoggingGuard { file_dir: None, _worker: None }
        }
    }
}

/// Install logging into the default directory.
pub fn init_logging_default() -> LoggingGuard {
    init_logging(LogConfig::new(log_dir()))
}

/// Install logging into the default directory with the settings' filter.
pub fn init_logging_with_settings(settings: &NavigatorSettings) -> LoggingGuard {
    init_logging(LogConfig::from_settings(settings))
}

fn install_console(filter: Option<&str>) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(filter))
        .with_ansi(true)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Subscriber already installed, keeping it");
    }
}

fn install_file_and_console(
    log_dir: &Path,
    filter: Option<&str>,
) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_dir)?;
    let (file, worker) = tracing_appender::non_blocking(appender);

    // The console only sees INFO and above; the file gets whatever the filter allows.
    let writer = std::io::stdout.with_max_level(tracing::Level::INFO).and(file);
    let installed = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(build_env_filter(filter))
        .with_ansi(false)
        .with_target(true)
        .try_init();
    if installed.is_err() {
        tracing::debug!(dir = %log_dir.display(), "Subscriber already installed, keeping it");
    }
    Ok(worker)
}

/// Explicit filter, then `DOLPHIN_LOG`, then `RUST_LOG`, then the default.
fn build_env_filter(explicit: Option<&str>) -> EnvFilter {
    let fallback = || EnvFilter::new(default_log_filter());
    match explicit {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
        None => EnvFilter::try_from_env("DOLPHIN_LOG")
            .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
            .unwrap_or_else(|_| fallback()),
    }
}

/// Get the default filter for this build type.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug,dolphin_core=trace,mysql_async=warn"
    } else {
        "info,dolphin_core=info,mysql_async=warn"
    }
}

/// Get the default log directory, `logs/` under the data directory.
pub fn log_dir() -> PathBuf {
    crate::config::default_data_dir().join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_filter_quiets_driver() {
        let filter = default_log_filter();
        assert!(filter.contains("dolphin_core="));
        assert!(filter.contains("mysql_async=warn"));
    }

    #[test]
    fn test_invalid_custom_filter_falls_back() {
        let filter = build_env_filter(Some("dolphin_core=loud"));
        assert_eq!(filter.to_string(), EnvFilter::new(default_log_filter()).to_string());
    }

    #[test]
    fn test_log_dir_is_under_data_dir() {
        assert_eq!(log_dir(), crate::config::default_data_dir().join("logs"));
    }

    #[test]
    fn test_settings_filter_reaches_config() {
        let settings = NavigatorSettings {
            log_filter: Some("dolphin_core=trace".to_string()),
            ..Default::default()
        };
        let config = LogConfig::from_settings(&settings);
        assert_eq!(config.log_dir, log_dir());
        assert_eq!(config.log_filter.as_deref(), Some("dolphin_core=trace"));
    }

    #[test]
    fn test_init_logging_creates_rolling_file() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");
        let config = LogConfig {
            log_dir: logs.clone(),
            is_pty: false,
            log_filter: Some("dolphin_core=debug".to_string()),
        };

        let guard = init_logging(config);
        tracing::info!("logging initialised");

        assert_eq!(guard.file_dir(), Some(logs.as_path()));
        drop(guard);
        let names: Vec<String> = std::fs::read_dir(&logs)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|name| name.starts_with(LOG_FILE_PREFIX)), "{names:?}");
    }

    #[test]
    fn test_unusable_log_dir_falls_back_to_console() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let config = LogConfig { log_dir: blocker.join("logs"), is_pty: false, log_filter: None };

        let guard = init_logging(config);

        assert!(guard.file_dir().is_none());
    }
}
