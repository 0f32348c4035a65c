//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tileproxy::cache::{CacheCapacity, NegativeCache, TileCacheStore};
use tileproxy::fetch::FetchCoordinator;
use tileproxy::provider::{
    AsyncHttpClient, ProviderConfig, ProviderError, UpstreamRegistry, UpstreamResponse,
    UrlTemplate,
};
use tileproxy::telemetry::ProxyMetrics;

type Responder = dyn Fn(usize) -> Result<UpstreamResponse, ProviderError> + Send + Sync;

/// Upstream stand-in that answers from a closure of the call index.
///
/// Clones share their call log, so a test can keep one clone for inspection
/// after handing another to the proxy.
#[derive(Clone)]
pub struct FakeUpstream {
    respond: Arc<Responder>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
    urls: Arc<Mutex<Vec<String>>>,
}

impl FakeUpstream {
    pub fn new(
        respond: impl Fn(usize) -> Result<UpstreamResponse, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Arc::new(respond),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            urls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always 200 with `body`.
    pub fn serving(body: &'static [u8]) -> Self {
        Self::new(move |_| Ok(png(body)))
    }

    /// Always the given status with an empty body.
    pub fn status(status: u16) -> Self {
        Self::new(move |_| Ok(UpstreamResponse::new(status, Vec::new())))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

impl AsyncHttpClient for FakeUpstream {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<UpstreamResponse, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().push(url.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.respond)(call)
    }
}

pub fn png(body: &[u8]) -> UpstreamResponse {
    UpstreamResponse::new(200, body.to_vec()).with_content_type("image/png")
}

pub fn provider(id: &str) -> ProviderConfig {
    let template = UrlTemplate::parse("https://upstream.example/{z}/{x}/{y}.png").unwrap();
    ProviderConfig::new(id, template).with_retries(2, Duration::from_millis(5))
}

/// Coordinator over a single provider with the given settings.
pub fn coordinator(
    provider: ProviderConfig,
    upstream: FakeUpstream,
    capacity: CacheCapacity,
) -> (FetchCoordinator<FakeUpstream>, Arc<FakeUpstream>) {
    let upstream = Arc::new(upstream);
    let coordinator = FetchCoordinator::new(
        Arc::new(UpstreamRegistry::new([provider])),
        Arc::new(TileCacheStore::new(capacity)),
        Arc::new(NegativeCache::new(Duration::from_secs(60), 1000)),
        Arc::clone(&upstream),
        Arc::new(ProxyMetrics::new()),
        Duration::from_secs(3600),
    );
    (coordinator, upstream)
}
