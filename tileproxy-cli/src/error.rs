//! CLI error types and exit codes.

use std::io;

use thiserror::Error;
use tileproxy::app::AppError;
use tileproxy::logging::LoggingError;

/// Exit code for configuration errors.
pub const EXIT_CONFIG: u8 = 2;

/// Exit code for any other fatal error.
pub const EXIT_FAILURE: u8 = 1;

/// Errors that end the process.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("failed to create Tokio runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("failed to set signal handler: {0}")]
    Signal(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Logging(_) => EXIT_CONFIG,
            CliError::App(e) if e.is_config() => EXIT_CONFIG,
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileproxy::config::ConfigError;

    #[test]
    fn test_config_errors_exit_2() {
        let app = AppError::Config(ConfigError::NoProviders);
        assert_eq!(CliError::App(app).exit_code(), EXIT_CONFIG);
    }

    #[test]
    fn test_runtime_errors_exit_1() {
        let app = AppError::Serve(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(CliError::App(app).exit_code(), EXIT_FAILURE);
        assert_eq!(CliError::Signal("x".into()).exit_code(), EXIT_FAILURE);
    }
}
