//! Tracing subscriber setup.
//!
//! Logs go to stderr, or to a file through a non-blocking writer when a path
//! is given. The filter comes from `directive` (e.g. `info` or
//! `tileproxy=debug,tower=warn`), falling back to `RUST_LOG`.

use std::fs;
use std::io;
use std::path::Path;

use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

/// Default filter directive.
pub const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Keeps the file writer flushing; drop it only at process exit.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Errors setting up logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter {directive:?}: {reason}")]
    Filter { directive: String, reason: String },

    #[error("cannot open log file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("a global logger is already installed")]
    AlreadyInstalled,
}

/// Install the global tracing subscriber.
///
/// # Arguments
///
/// * `directive` - Filter directive; `None` reads `RUST_LOG`, then [`DEFAULT_LOG_DIRECTIVE`]
/// * `log_file` - Write to this file instead of stderr
pub fn init_logging(
    directive: Option<&str>,
    log_file: Option<&Path>,
) -> Result<LoggingGuard, LoggingError> {
    let filter = build_filter(directive)?;
    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]"
    ));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_target(true);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| LoggingError::File {
                    path: path.display().to_string(),
                    source,
                })?;
            }
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::File {
                    path: path.display().to_string(),
                    source,
                })?;
            let (writer, guard) = tracing_appender::non_blocking(file);

            builder
                .with_ansi(false)
                .with_writer(writer)
                .try_init()
                .map_err(|_| LoggingError::AlreadyInstalled)?;
            Ok(LoggingGuard { _file: Some(guard) })
        }
        None => {
            builder
                .with_writer(io::stderr)
                .try_init()
                .map_err(|_| LoggingError::AlreadyInstalled)?;
            Ok(LoggingGuard { _file: None })
        }
    }
}

fn build_filter(directive: Option<&str>) -> Result<EnvFilter, LoggingError> {
    match directive {
        Some(directive) => {
            EnvFilter::try_new(directive).map_err(|e| LoggingError::Filter {
                directive: directive.to_string(),
                reason: e.to_string(),
            })
        }
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_directives() {
        assert!(build_filter(Some("debug")).is_ok());
        assert!(build_filter(Some("tileproxy=trace,tower=warn")).is_ok());
    }

    #[test]
    fn test_filter_rejects_garbage() {
        let err = build_filter(Some("tileproxy=notalevel")).unwrap_err();
        assert!(matches!(err, LoggingError::Filter { .. }));
    }
}
