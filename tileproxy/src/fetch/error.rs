//! Fetch failure taxonomy.

use std::sync::Arc;

use thiserror::Error;

use crate::cache::CacheEntry;

/// Why a tile could not be resolved.
///
/// Clone so one outcome can be broadcast to every coalesced waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The tile key names a provider that is not configured.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Every attempt failed transiently (timeout, connection, 5xx).
    #[error("upstream unavailable after {attempts} attempt(s): {reason}")]
    UpstreamUnavailable { attempts: u32, reason: String },

    /// The upstream answered with a non-retryable status.
    #[error("upstream rejected request with status {status}")]
    UpstreamRejected { status: u16 },

    /// The upstream has no tile for this key.
    #[error("tile not found upstream")]
    NotFound,

    /// A failure inside the proxy itself.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Fieldless discriminant of [`FetchError`], used for counters and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    UnknownProvider,
    UpstreamUnavailable,
    UpstreamRejected,
    NotFound,
    Internal,
}

impl FetchError {
    /// Discriminant without payload.
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::UnknownProvider(_) => FetchErrorKind::UnknownProvider,
            Self::UpstreamUnavailable { .. } => FetchErrorKind::UpstreamUnavailable,
            Self::UpstreamRejected { .. } => FetchErrorKind::UpstreamRejected,
            Self::NotFound => FetchErrorKind::NotFound,
            Self::Internal(_) => FetchErrorKind::Internal,
        }
    }
}

/// Shared result of one fetch, delivered to the owner and all waiters.
pub type FetchOutcome = Result<Arc<CacheEntry>, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(FetchError::NotFound.kind(), FetchErrorKind::NotFound);
        assert_eq!(
            FetchError::UpstreamRejected { status: 403 }.kind(),
            FetchErrorKind::UpstreamRejected
        );
        assert_eq!(
            FetchError::UnknownProvider("osm".into()).kind(),
            FetchErrorKind::UnknownProvider
        );
    }

    #[test]
    fn test_display() {
        let err = FetchError::UpstreamUnavailable {
            attempts: 3,
            reason: "timeout".into(),
        };
        assert_eq!(
            err.to_string(),
            "upstream unavailable after 3 attempt(s): timeout"
        );
    }
}
