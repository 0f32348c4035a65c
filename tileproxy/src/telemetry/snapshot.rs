//! Point-in-time copy of the proxy counters.

use serde::Serialize;

/// Counters captured by [`ProxyMetrics::snapshot`](super::ProxyMetrics::snapshot).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    pub uptime_secs: u64,
    pub requests: u64,
    pub cache_hits: u64,
    pub negative_hits: u64,
    pub cache_misses: u64,
    pub coalesced: u64,
    pub upstream_requests: u64,
    pub upstream_retries: u64,
    pub upstream_bytes: u64,
    pub fetches_succeeded: u64,
    pub not_found: u64,
    pub unknown_provider: u64,
    pub upstream_rejected: u64,
    pub upstream_unavailable: u64,
    pub internal_errors: u64,
}

impl TelemetrySnapshot {
    /// Fetches that ended in any error.
    pub fn fetch_failures(&self) -> u64 {
        self.not_found
            + self.unknown_provider
            + self.upstream_rejected
            + self.upstream_unavailable
            + self.internal_errors
    }

    /// Fraction of requests answered from either cache, 0.0 when idle.
    pub fn hit_rate(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        (self.cache_hits + self.negative_hits) as f64 / self.requests as f64
    }
}
