//! Core types for the tile cache.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use crate::tile::TileKey;

/// A fetched tile as held by the cache.
///
/// Entries are created on a successful upstream fetch, replaced wholesale on
/// refresh and dropped on eviction; nothing mutates an entry in place. The
/// cache hands out `Arc<CacheEntry>`, so a reader always sees a complete entry.
///
/// `fetched_at` uses the tokio clock so freshness follows `tokio::time` in
/// tests that pause or advance time.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Tile this entry holds.
    pub key: TileKey,
    /// Tile body as returned by the upstream.
    pub bytes: Bytes,
    /// MIME type served with the body.
    pub content_type: String,
    /// When the upstream response was received.
    pub fetched_at: Instant,
    /// How long after `fetched_at` the entry is fresh.
    pub ttl: Duration,
    /// Body size in bytes; the entry's weight under a byte capacity.
    pub size_bytes: u64,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(key: TileKey, bytes: Bytes, content_type: impl Into<String>, ttl: Duration) -> Self {
        let size_bytes = bytes.len() as u64;
        Self {
            key,
            bytes,
            content_type: content_type.into(),
            fetched_at: Instant::now(),
            ttl,
            size_bytes,
        }
    }

    /// Time since the tile was fetched.
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Whether the entry is still within its TTL.
    pub fn is_fresh(&self) -> bool {
        self.age() < self.ttl
    }

    /// Freshness left; zero once stale.
    pub fn remaining_ttl(&self) -> Duration {
        self.ttl.saturating_sub(self.age())
    }
}

/// Bound on the tile cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCapacity {
    /// Maximum total `size_bytes` of all entries.
    Bytes(u64),
    /// Maximum number of entries.
    Entries(u64),
}

impl CacheCapacity {
    /// The numeric limit, in whichever unit applies.
    pub fn limit(&self) -> u64 {
        match self {
            Self::Bytes(n) | Self::Entries(n) => *n,
        }
    }
}

impl fmt::Display for CacheCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(n) => write!(f, "{} bytes", n),
            Self::Entries(n) => write!(f, "{} entries", n),
        }
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    /// Reads that returned a fresh entry.
    pub hits: u64,
    /// Reads that found nothing usable (absent or stale).
    pub misses: u64,
    /// Subset of `misses` where a stale entry was present.
    pub stale: u64,
    /// Entries removed to restore capacity.
    pub evictions: u64,
    /// Current number of entries.
    pub entry_count: u64,
    /// Current total weight (bytes or entries, per capacity).
    pub weighted_size: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cache: {} hits, {} misses ({} stale), {} evictions, {} entries",
            self.hits, self.misses, self.stale, self.evictions, self.entry_count
        )
    }
}
