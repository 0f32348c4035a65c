//! Bounded in-memory tile store with LRU eviction using moka.
//!
//! Moka uses lock-free data structures for reads and serializes all
//! structural changes (inserts, removals, evictions) through its own
//! maintenance step, so the store never needs an outer lock and never holds
//! one across an await point.
//!
//! # Freshness
//!
//! Moka's own TTL support removes entries outright. Tiles need softer
//! behaviour: a stale tile should read as absent, so the caller refetches,
//! yet stay in place until the fresh copy overwrites it. Each entry therefore
//! carries its own `fetched_at` and TTL and [`TileCacheStore::get`] checks them.
//!
//! # Eviction
//!
//! The store uses moka's LRU policy rather than its default TinyLFU admission,
//! which may refuse to admit a new tile in favour of a frequently used one.
//! Reads are recorded as accesses, so a tile that keeps being requested is the
//! last to go.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::future::Cache;
use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use tracing::trace;

use super::types::{CacheCapacity, CacheEntry, CacheStats};
use crate::tile::TileKey;

/// Bounded tile store.
///
/// Construct one per proxy and pass it explicitly to whatever needs it; there
/// is no process-wide instance.
pub struct TileCacheStore {
    /// The underlying moka cache
    cache: Cache<TileKey, Arc<CacheEntry>>,
    capacity: CacheCapacity,
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
    /// Shared with the eviction listener, which has no access to `self`.
    evictions: Arc<AtomicU64>,
}

impl TileCacheStore {
    /// Create an empty store bounded by `capacity`.
    pub fn new(capacity: CacheCapacity) -> Self {
        let evictions = Arc::new(AtomicU64::new(0));
        let listener_evictions = Arc::clone(&evictions);

        let builder = Cache::builder()
            .eviction_policy(EvictionPolicy::lru())
            .max_capacity(capacity.limit())
            .eviction_listener(move |key: Arc<TileKey>, _entry, cause| {
                if cause == RemovalCause::Size {
                    listener_evictions.fetch_add(1, Ordering::Relaxed);
                    trace!(tile = %key, "Evicted tile to restore capacity");
                }
            });

        let builder = match capacity {
            CacheCapacity::Bytes(_) => {
                builder.weigher(|_key: &TileKey, entry: &Arc<CacheEntry>| -> u32 {
                    // moka uses u32 weights; zero-weight entries would never be evicted
                    entry.size_bytes.clamp(1, u64::from(u32::MAX)) as u32
                })
            }
            CacheCapacity::Entries(_) => builder,
        };

        Self {
            cache: builder.build(),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            evictions,
        }
    }

    /// Get a fresh entry.
    ///
    /// Returns `None` both when the tile is absent and when the cached copy
    /// is older than its TTL. A stale copy is left in place. Either way the
    /// read counts as an access for LRU purposes.
    pub async fn get(&self, key: &TileKey) -> Option<Arc<CacheEntry>> {
        match self.cache.get(key).await {
            Some(entry) if entry.is_fresh() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            Some(_) => {
                self.stale.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Get a fresh entry without recording a hit or miss.
    pub async fn peek(&self, key: &TileKey) -> Option<Arc<CacheEntry>> {
        self.cache.get(key).await.filter(|entry| entry.is_fresh())
    }

    /// Insert or replace the entry for `entry.key`.
    ///
    /// Evicts least-recently-used entries until the store is back within
    /// capacity before returning.
    pub async fn put(&self, entry: CacheEntry) -> Arc<CacheEntry> {
        let entry = Arc::new(entry);
        self.cache
            .insert(entry.key.clone(), Arc::clone(&entry))
            .await;

        // Apply pending reads and run eviction now rather than lazily
        self.cache.run_pending_tasks().await;
        entry
    }

    /// Remove the entry for `key`, if any.
    pub async fn invalidate(&self, key: &TileKey) {
        self.cache.invalidate(key).await;
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    /// Whether any entry, fresh or stale, exists for `key`.
    ///
    /// Does not count as an access.
    pub fn contains(&self, key: &TileKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Get the current number of entries in the cache.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Current total weight: bytes or entries, depending on capacity.
    pub fn weighted_size(&self) -> u64 {
        self.cache.weighted_size()
    }

    /// The configured bound.
    pub fn capacity(&self) -> CacheCapacity {
        self.capacity
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entry_count: self.entry_count(),
            weighted_size: self.weighted_size(),
        }
    }

    /// Run moka's pending maintenance (eviction, size bookkeeping).
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}
