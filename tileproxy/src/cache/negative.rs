//! Short-lived memory of tiles the upstream reported missing.
//!
//! Without it, every request for a permanently absent tile (outside the
//! provider's coverage, say) goes upstream. Entries live for `negative_ttl`,
//! set independently of the tile TTL; a zero TTL disables the cache.

use std::time::Duration;

use moka::future::Cache;
use tokio::time::Instant;

use crate::tile::TileKey;

/// Longest accepted negative TTL (7 days).
///
/// moka refuses expiry durations beyond 1000 years; anything past a week is
/// a configuration mistake for a "tile may appear later" memory anyway.
pub const MAX_NEGATIVE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Remembers tiles that recently came back as not found.
pub struct NegativeCache {
    /// `None` when negative caching is disabled.
    entries: Option<Cache<TileKey, Instant>>,
    ttl: Duration,
}

impl NegativeCache {
    /// Create a negative cache.
    ///
    /// # Arguments
    ///
    /// * `ttl` - How long a not-found result is trusted; zero disables caching
    /// * `max_entries` - Bound on remembered keys
    ///
    /// A `ttl` above [`MAX_NEGATIVE_TTL`] is clamped to it.
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let ttl = ttl.min(MAX_NEGATIVE_TTL);
        let entries = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(max_entries)
                // Backstop cleanup; freshness itself is checked against the tokio clock
                .time_to_live(ttl)
                .build()
        });

        Self { entries, ttl }
    }

    /// A negative cache that never remembers anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    /// Whether negative results are cached at all.
    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Configured negative TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True if `key` was reported missing less than `ttl` ago.
    pub async fn contains(&self, key: &TileKey) -> bool {
        let Some(entries) = &self.entries else {
            return false;
        };
        match entries.get(key).await {
            Some(recorded_at) => recorded_at.elapsed() < self.ttl,
            None => false,
        }
    }

    /// Record that the upstream has no tile for `key`.
    pub async fn insert(&self, key: TileKey) {
        if let Some(entries) = &self.entries {
            entries.insert(key, Instant::now()).await;
        }
    }

    /// Forget a negative result.
    pub async fn remove(&self, key: &TileKey) {
        if let Some(entries) = &self.entries {
            entries.invalidate(key).await;
        }
    }

    /// Number of remembered keys.
    pub fn len(&self) -> u64 {
        self.entries.as_ref().map_or(0, |e| e.entry_count())
    }

    /// True when nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(x: u32) -> TileKey {
        TileKey::new("test", 8, x, 7).unwrap()
    }

    #[tokio::test]
    async fn test_huge_ttl_is_clamped() {
        let cache = NegativeCache::new(Duration::from_secs(u64::MAX / 4), 10);
        assert_eq!(cache.ttl(), MAX_NEGATIVE_TTL);

        cache.insert(key(1)).await;
        assert!(cache.contains(&key(1)).await);
    }

    #[tokio::test]
    async fn test_insert_and_contains() {
        let cache = NegativeCache::new(Duration::from_secs(60), 100);
        assert!(cache.is_enabled());
        assert!(!cache.contains(&key(1)).await);

        cache.insert(key(1)).await;
        assert!(cache.contains(&key(1)).await);
        assert!(!cache.contains(&key(2)).await);
    }

    #[tokio::test]
    async fn test_expires_after_ttl() {
        let cache = NegativeCache::new(Duration::from_millis(30), 100);
        cache.insert(key(1)).await;
        assert!(cache.contains(&key(1)).await);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!cache.contains(&key(1)).await);
    }

    #[tokio::test]
    async fn test_disabled_remembers_nothing() {
        let cache = NegativeCache::disabled();
        assert!(!cache.is_enabled());

        cache.insert(key(1)).await;
        assert!(!cache.contains(&key(1)).await);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = NegativeCache::new(Duration::from_secs(60), 100);
        cache.insert(key(1)).await;
        cache.remove(&key(1)).await;
        assert!(!cache.contains(&key(1)).await);
    }
}
