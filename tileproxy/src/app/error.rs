//! Application error types.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use crate::config::ConfigError;
use crate::provider::ProviderError;

/// Errors that can occur during application lifecycle.
#[derive(Debug)]
pub enum AppError {
    /// Configuration or provider description is invalid.
    Config(ConfigError),

    /// Failed to create the upstream HTTP client.
    HttpClient(ProviderError),

    /// Failed to bind the listen address.
    Bind { addr: SocketAddr, source: io::Error },

    /// The HTTP server stopped with an error.
    Serve(io::Error),
}

impl AppError {
    /// Whether the failure is a configuration problem rather than a runtime one.
    pub fn is_config(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            AppError::Bind { addr, source } => {
                write!(f, "Failed to bind to {}: {}", addr, source)
            }
            AppError::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::HttpClient(e) => Some(e),
            AppError::Bind { source, .. } => Some(source),
            AppError::Serve(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::HttpClient(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config(ConfigError::NoProviders);
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.is_config());
    }

    #[test]
    fn test_bind_error_is_not_config() {
        let err = AppError::Bind {
            addr: "127.0.0.1:8117".parse().unwrap(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(!err.is_config());
        assert!(err.to_string().contains("127.0.0.1:8117"));
    }
}
