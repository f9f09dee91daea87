// crates/observability/src/lib.rs
//! Tracing subscriber setup for processes embedding statline.
//!
//! Console output goes to stderr, as text or JSON. When a log directory is
//! configured, the same events are also written to a daily-rolling file
//! through a non-blocking writer; keep the returned guard alive until exit
//! so buffered lines are flushed.

use std::path::PathBuf;

use statline_core::LoggingConfig;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name prefix for rolling log files; the date is appended.
pub const LOG_FILE_PREFIX: &str = "statline.log";

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Invalid log filter {directives:?}: {source}")]
    Filter {
        directives: String,
        #[source]
        source: ParseError,
    },

    #[error("Failed to create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Global tracing subscriber already installed: {0}")]
    AlreadyInstalled(#[from] TryInitError),
}

/// `RUST_LOG` when set and non-empty, otherwise the configured filter.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, InitError> {
    let directives = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(env) if !env.trim().is_empty() => env,
        _ => config.filter.clone(),
    };
    EnvFilter::try_new(&directives).map_err(|source| InitError::Filter { directives, source })
}

/// Install the global subscriber described by `config`.
///
/// Returns the file writer's guard when file logging is enabled.
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>, InitError> {
    let filter = build_filter(config)?;

    let (file_writer, guard) = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| InitError::LogDir {
                path: dir.clone(),
                source,
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(file_writer.map(|w| fmt::layer().json().with_ansi(false).with_writer(w)))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .try_init()?;
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config(filter: &str) -> LoggingConfig {
        LoggingConfig {
            filter: filter.into(),
            ..LoggingConfig::default()
        }
    }

    #[test]
    #[serial]
    fn test_configured_filter_used_without_rust_log() {
        std::env::remove_var("RUST_LOG");
        let filter = build_filter(&config("warn,statline_db=debug")).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("statline_db=debug"), "{rendered}");
    }

    #[test]
    #[serial]
    fn test_rust_log_wins() {
        std::env::set_var("RUST_LOG", "statline_core=trace");
        let filter = build_filter(&config("info"));
        std::env::remove_var("RUST_LOG");
        let rendered = filter.unwrap().to_string();
        assert!(rendered.contains("statline_core=trace"), "{rendered}");
    }

    #[test]
    #[serial]
    fn test_bad_filter_is_reported() {
        std::env::remove_var("RUST_LOG");
        let err = build_filter(&config("statline_db=loud")).unwrap_err();
        assert!(matches!(err, InitError::Filter { ref directives, .. } if directives == "statline_db=loud"));
    }

    // The global subscriber can be installed once per process, so both the
    // first and the second install are checked here.
    #[test]
    #[serial]
    fn test_init_writes_rolling_file_once() {
        std::env::remove_var("RUST_LOG");
        let tmp = tempfile::tempdir().unwrap();
        let logging = LoggingConfig {
            filter: "info".into(),
            json: true,
            directory: Some(tmp.path().join("logs")),
        };

        let guard = init_tracing(&logging).unwrap();
        assert!(guard.is_some());
        tracing::warn!(target: "statline_observability", "hello from the test");
        drop(guard);

        let files: Vec<_> = std::fs::read_dir(tmp.path().join("logs"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(
            files.iter().any(|name| name.starts_with(LOG_FILE_PREFIX)),
            "{files:?}"
        );

        let err = init_tracing(&config("info")).unwrap_err();
        assert!(matches!(err, InitError::AlreadyInstalled(_)));
    }
}
