//! Fetch coordinator: cache lookup, single-flight upstream fetch, retry.
//!
//! # Flow
//!
//! ```text
//! resolve(key)
//!   ├─ registry lookup ──────────── unknown ──► UnknownProvider
//!   ├─ tile cache ───────────────── fresh ────► HIT
//!   ├─ negative cache ───────────── recent ───► NotFound
//!   └─ coalescer.register(key)
//!        ├─ Coalesced(rx) ──────────────────► await rx (COALESCED)
//!        └─ NewRequest(rx)
//!             ├─ spawn task ─► re-check caches ─► retry loop ─► put / negative insert
//!             │                                              └► coalescer.complete
//!             └─ await rx (MISS)
//! ```
//!
//! The upstream fetch runs in its own task. Every caller, the owner
//! included, only waits on the broadcast, so dropping any caller's future
//! leaves the fetch running for the remaining waiters and the cache.
//! The cache is populated before the in-flight registration is removed, so
//! a request arriving after completion always finds the tile.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::coalescer::{CoalesceResult, InFlightGuard, RequestCoalescer};
use super::error::{FetchError, FetchErrorKind, FetchOutcome};
use super::retry::RetryPolicy;
use crate::cache::{CacheEntry, NegativeCache, TileCacheStore};
use crate::provider::{
    AsyncHttpClient, ProviderConfig, ProviderError, UpstreamRegistry, UpstreamResponse,
};
use crate::telemetry::ProxyMetrics;
use crate::tile::TileKey;

/// Content type used when neither the upstream nor the provider names one.
pub const DEFAULT_CONTENT_TYPE: &str = "image/png";

/// Where a resolved tile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSource {
    /// Served from the tile cache.
    Hit,
    /// Not cached when requested; this request started the fetch.
    Miss,
    /// Shared the result of a fetch started by another request.
    Coalesced,
}

impl TileSource {
    /// Value for the `X-Cache` response header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Coalesced => "COALESCED",
        }
    }
}

/// A resolved tile and how it was obtained.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub entry: Arc<CacheEntry>,
    pub source: TileSource,
}

/// Resolves tile keys to cached or freshly fetched tiles.
///
/// Cheap to clone; all clones share one cache, coalescer and client.
pub struct FetchCoordinator<C: AsyncHttpClient> {
    inner: Arc<Inner<C>>,
}

impl<C: AsyncHttpClient> Clone for FetchCoordinator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<C> {
    registry: Arc<UpstreamRegistry>,
    cache: Arc<TileCacheStore>,
    negative: Arc<NegativeCache>,
    client: Arc<C>,
    metrics: Arc<ProxyMetrics>,
    coalescer: Arc<RequestCoalescer>,
    default_ttl: Duration,
}

/// What an upstream response means for the fetch.
#[derive(Debug, PartialEq)]
enum Classified {
    Tile(UpstreamResponse),
    NotFound,
    Rejected(u16),
    Transient(String),
}

fn classify(response: UpstreamResponse) -> Classified {
    match response.status {
        200..=299 if response.body.is_empty() => Classified::NotFound,
        200..=299 => Classified::Tile(response),
        404 | 410 => Classified::NotFound,
        408 | 429 | 500..=599 => {
            Classified::Transient(format!("upstream returned status {}", response.status))
        }
        status => Classified::Rejected(status),
    }
}

impl<C: AsyncHttpClient> FetchCoordinator<C> {
    /// Create a coordinator.
    ///
    /// # Arguments
    ///
    /// * `registry` - Configured providers
    /// * `cache` - Tile store shared with anything else that serves tiles
    /// * `negative` - Not-found memory; pass [`NegativeCache::disabled`] to turn it off
    /// * `client` - HTTP client for upstream requests
    /// * `metrics` - Counters updated on every request
    /// * `default_ttl` - Freshness for providers without their own TTL
    pub fn new(
        registry: Arc<UpstreamRegistry>,
        cache: Arc<TileCacheStore>,
        negative: Arc<NegativeCache>,
        client: Arc<C>,
        metrics: Arc<ProxyMetrics>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                cache,
                negative,
                client,
                metrics,
                coalescer: Arc::new(RequestCoalescer::new()),
                default_ttl,
            }),
        }
    }

    /// Resolve `key` to a tile.
    pub async fn resolve(&self, key: &TileKey) -> FetchOutcome {
        self.resolve_with_source(key).await.map(|resolved| resolved.entry)
    }

    /// Resolve `key`, also reporting whether the tile was a hit, a fresh
    /// fetch or a coalesced one.
    pub async fn resolve_with_source(&self, key: &TileKey) -> Result<Resolved, FetchError> {
        let inner = &self.inner;
        inner.metrics.request();

        let provider = match inner.registry.lookup(key.provider()) {
            Ok(provider) => provider,
            Err(_) => {
                debug!(tile = %key, "Unknown provider");
                inner.metrics.fetch_failed(FetchErrorKind::UnknownProvider);
                return Err(FetchError::UnknownProvider(key.provider().to_string()));
            }
        };

        if let Some(resolved) = inner.lookup_cached(key).await {
            return resolved;
        }
        inner.metrics.cache_miss();

        match inner.coalescer.register(key) {
            CoalesceResult::Coalesced(rx) => {
                inner.metrics.coalesced();
                debug!(tile = %key, "Waiting on in-flight fetch");
                Self::await_outcome(rx).await.map(|entry| Resolved {
                    entry,
                    source: TileSource::Coalesced,
                })
            }
            CoalesceResult::NewRequest { key, rx } => {
                // Spawned before any await so a dropped owner cannot strand waiters
                let guard = InFlightGuard::new(Arc::clone(&inner.coalescer), key.clone());
                let task_inner = Arc::clone(inner);
                let provider = provider.clone();
                tokio::spawn(async move {
                    let outcome = task_inner.recheck_or_fetch(&provider, &key).await;
                    guard.complete(outcome);
                });

                Self::await_outcome(rx).await.map(|entry| Resolved {
                    entry,
                    source: TileSource::Miss,
                })
            }
        }
    }

    /// Drop any cached state for `key`, positive or negative.
    ///
    /// A fetch already in flight is unaffected and will repopulate the cache.
    pub async fn invalidate(&self, key: &TileKey) {
        self.inner.cache.invalidate(key).await;
        self.inner.negative.remove(key).await;
    }

    /// Tile store used by this coordinator.
    pub fn cache(&self) -> &Arc<TileCacheStore> {
        &self.inner.cache
    }

    /// Negative cache used by this coordinator.
    pub fn negative_cache(&self) -> &Arc<NegativeCache> {
        &self.inner.negative
    }

    /// Configured providers.
    pub fn registry(&self) -> &Arc<UpstreamRegistry> {
        &self.inner.registry
    }

    /// Request counters.
    pub fn metrics(&self) -> &Arc<ProxyMetrics> {
        &self.inner.metrics
    }

    /// Number of upstream fetches currently running.
    pub fn in_flight(&self) -> usize {
        self.inner.coalescer.in_flight()
    }

    async fn await_outcome(mut rx: broadcast::Receiver<FetchOutcome>) -> FetchOutcome {
        match rx.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Internal(
                "fetch ended without a result".to_string(),
            )),
        }
    }
}

impl<C: AsyncHttpClient> Inner<C> {
    /// Answer from the tile cache or the negative cache, if either can.
    async fn lookup_cached(&self, key: &TileKey) -> Option<Result<Resolved, FetchError>> {
        if let Some(entry) = self.cache.get(key).await {
            debug!(tile = %key, age_ms = entry.age().as_millis() as u64, "Cache hit");
            self.metrics.cache_hit();
            return Some(Ok(Resolved {
                entry,
                source: TileSource::Hit,
            }));
        }
        if self.negative.contains(key).await {
            debug!(tile = %key, "Negative cache hit");
            self.metrics.negative_hit();
            return Some(Err(FetchError::NotFound));
        }
        None
    }

    /// Owner side of a registered fetch.
    ///
    /// A concurrent fetch may have completed between the caller's miss and its
    /// registration, so the caches are consulted once more first.
    async fn recheck_or_fetch(&self, provider: &ProviderConfig, key: &TileKey) -> FetchOutcome {
        if let Some(entry) = self.cache.peek(key).await {
            debug!(tile = %key, "Tile cached by a concurrent fetch");
            return Ok(entry);
        }
        if self.negative.contains(key).await {
            return Err(FetchError::NotFound);
        }

        let outcome = self.fetch_and_store(provider, key).await;
        match &outcome {
            Ok(entry) => self.metrics.fetch_succeeded(entry.size_bytes),
            Err(e) => self.metrics.fetch_failed(e.kind()),
        }
        outcome
    }

    /// Fetch `key` upstream with retries and record the result in the caches.
    async fn fetch_and_store(&self, provider: &ProviderConfig, key: &TileKey) -> FetchOutcome {
        let url = provider.tile_url(key);
        let policy = RetryPolicy::for_provider(provider);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.metrics.upstream_request();

            let reason = match self.client.get(&url, provider.timeout).await {
                Ok(response) => match classify(response) {
                    Classified::Tile(response) => {
                        return Ok(self.store(provider, key, response).await);
                    }
                    Classified::NotFound => {
                        debug!(tile = %key, "Upstream has no tile");
                        self.negative.insert(key.clone()).await;
                        return Err(FetchError::NotFound);
                    }
                    Classified::Rejected(status) => {
                        warn!(tile = %key, status, "Upstream rejected request");
                        return Err(FetchError::UpstreamRejected { status });
                    }
                    Classified::Transient(reason) => reason,
                },
                Err(e) if e.is_transient() => e.to_string(),
                Err(ProviderError::UnknownProvider(id)) => {
                    return Err(FetchError::UnknownProvider(id));
                }
                Err(e) => {
                    warn!(tile = %key, error = %e, "Upstream request could not be made");
                    return Err(FetchError::Internal(e.to_string()));
                }
            };

            match policy.delay_for_attempt(attempt) {
                Some(delay) => {
                    warn!(
                        tile = %key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "Transient upstream failure, retrying"
                    );
                    self.metrics.upstream_retry();
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(tile = %key, attempts = attempt, reason = %reason, "Upstream unavailable");
                    return Err(FetchError::UpstreamUnavailable {
                        attempts: attempt,
                        reason,
                    });
                }
            }
        }
    }

    async fn store(
        &self,
        provider: &ProviderConfig,
        key: &TileKey,
        response: UpstreamResponse,
    ) -> Arc<CacheEntry> {
        let content_type = response
            .content_type
            .or_else(|| provider.content_type.clone())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let ttl = provider.ttl.unwrap_or(self.default_ttl);

        let entry = CacheEntry::new(key.clone(), response.body, content_type, ttl);
        debug!(tile = %key, bytes = entry.size_bytes, "Fetched tile");

        let entry = self.cache.put(entry).await;
        self.negative.remove(key).await;
        entry
    }
}
