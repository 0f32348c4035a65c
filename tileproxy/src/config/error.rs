//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors found while loading startup configuration.
///
/// All of these are fatal: the proxy refuses to start rather than fail
/// individual requests later.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The provider description could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The provider description is not valid JSON of the expected shape.
    #[error("invalid provider description: {0}")]
    Parse(String),

    /// The provider description declares no providers.
    #[error("provider description declares no providers")]
    NoProviders,

    /// One provider record failed validation.
    #[error("provider {id:?}: {reason}")]
    InvalidProvider { id: String, reason: String },

    /// A proxy setting is out of range.
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_provider_display() {
        let err = ConfigError::InvalidProvider {
            id: "osm".to_string(),
            reason: "timeoutMillis must be greater than zero".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "provider \"osm\": timeoutMillis must be greater than zero"
        );
    }

    #[test]
    fn test_read_error_keeps_source() {
        use std::error::Error as _;

        let err = ConfigError::Read {
            path: PathBuf::from("/etc/tileproxy/providers.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("providers.json"));
        assert!(err.source().is_some());
    }
}
