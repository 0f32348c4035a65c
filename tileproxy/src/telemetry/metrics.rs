//! Atomic counters for the tile fetch path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::snapshot::TelemetrySnapshot;
use crate::fetch::FetchErrorKind;

/// Lock-free counters updated from the request path.
///
/// All counters use relaxed ordering: they are observability data, read
/// independently of each other, and never used for synchronization.
#[derive(Debug)]
pub struct ProxyMetrics {
    started_at: Instant,
    requests: AtomicU64,
    cache_hits: AtomicU64,
    negative_hits: AtomicU64,
    cache_misses: AtomicU64,
    coalesced: AtomicU64,
    upstream_requests: AtomicU64,
    upstream_retries: AtomicU64,
    upstream_bytes: AtomicU64,
    fetches_succeeded: AtomicU64,
    not_found: AtomicU64,
    unknown_provider: AtomicU64,
    upstream_rejected: AtomicU64,
    upstream_unavailable: AtomicU64,
    internal_errors: AtomicU64,
}

impl Default for ProxyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            negative_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            upstream_requests: AtomicU64::new(0),
            upstream_retries: AtomicU64::new(0),
            upstream_bytes: AtomicU64::new(0),
            fetches_succeeded: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            unknown_provider: AtomicU64::new(0),
            upstream_rejected: AtomicU64::new(0),
            upstream_unavailable: AtomicU64::new(0),
            internal_errors: AtomicU64::new(0),
        }
    }

    /// A tile was requested.
    pub fn request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Served from the tile cache.
    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Answered not-found from the negative cache.
    pub fn negative_hit(&self) {
        self.negative_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Neither cache could answer.
    pub fn cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Attached to a fetch already in flight.
    pub fn coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    /// One HTTP request sent upstream (first attempt or retry).
    pub fn upstream_request(&self) {
        self.upstream_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// A retry was scheduled after a transient failure.
    pub fn upstream_retry(&self) {
        self.upstream_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// A fetch completed with a tile of `bytes` bytes.
    pub fn fetch_succeeded(&self, bytes: u64) {
        self.fetches_succeeded.fetch_add(1, Ordering::Relaxed);
        self.upstream_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// A fetch completed with an error.
    pub fn fetch_failed(&self, kind: FetchErrorKind) {
        let counter = match kind {
            FetchErrorKind::NotFound => &self.not_found,
            FetchErrorKind::UnknownProvider => &self.unknown_provider,
            FetchErrorKind::UpstreamRejected => &self.upstream_rejected,
            FetchErrorKind::UpstreamUnavailable => &self.upstream_unavailable,
            FetchErrorKind::Internal => &self.internal_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of HTTP requests sent upstream so far.
    pub fn upstream_requests(&self) -> u64 {
        self.upstream_requests.load(Ordering::Relaxed)
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            uptime_secs: self.started_at.elapsed().as_secs(),
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            negative_hits: self.negative_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            upstream_requests: self.upstream_requests.load(Ordering::Relaxed),
            upstream_retries: self.upstream_retries.load(Ordering::Relaxed),
            upstream_bytes: self.upstream_bytes.load(Ordering::Relaxed),
            fetches_succeeded: self.fetches_succeeded.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            unknown_provider: self.unknown_provider.load(Ordering::Relaxed),
            upstream_rejected: self.upstream_rejected.load(Ordering::Relaxed),
            upstream_unavailable: self.upstream_unavailable.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
        }
    }
}
