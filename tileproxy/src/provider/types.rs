//! Shared provider types.

use bytes::Bytes;
use thiserror::Error;

/// Errors raised while talking to, or looking up, an upstream provider.
///
/// Messages never include upstream URLs: they end up in logs that may be
/// shipped elsewhere, and URL templates can carry API keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// No provider with this id is registered.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The request did not complete within the provider's timeout.
    #[error("upstream request timed out")]
    Timeout,

    /// Connecting to the upstream or reading its response failed.
    #[error("upstream connection failed: {0}")]
    Connection(String),

    /// The HTTP client could not be built or the request was malformed.
    #[error("HTTP client error: {0}")]
    Http(String),
}

impl ProviderError {
    /// Whether a retry might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connection(_))
    }
}

/// Raw upstream response, before any status interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if the upstream sent one.
    pub content_type: Option<String>,
    /// Response body.
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Create a response with the given status and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    /// Attach a content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
