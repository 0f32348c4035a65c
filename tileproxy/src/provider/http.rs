//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use super::types::{ProviderError, UpstreamResponse};

/// Connect timeout applied to every upstream connection.
///
/// The per-request timeout from the provider config bounds the whole exchange;
/// this only stops a dead host from holding a socket for that full duration.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Trait for async HTTP client operations.
///
/// This abstraction allows the fetch coordinator to be driven by a scripted
/// client in tests. Implementations return the raw status and body; deciding
/// what a status means is left to the caller.
pub trait AsyncHttpClient: Send + Sync + 'static {
    /// Performs an HTTP GET request bounded by `timeout`.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `timeout` - Total time allowed for the request, body included
    fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<UpstreamResponse, ProviderError>> + Send;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("tileproxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, url: &str, timeout: Duration) -> Result<UpstreamResponse, ProviderError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await.map_err(classify_reqwest_error)?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Maps a reqwest error onto the provider taxonomy without leaking the URL.
fn classify_reqwest_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_builder() {
        ProviderError::Http(e.without_url().to_string())
    } else {
        ProviderError::Connection(e.without_url().to_string())
    }
}
