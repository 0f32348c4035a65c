//! Tile caching.
//!
//! - [`TileCacheStore`]: bounded key → tile store with LRU eviction and
//!   per-entry soft expiry, backed by moka
//! - [`NegativeCache`]: short-lived record of tiles the upstream reported
//!   missing
//!
//! # Example
//!
//! ```ignore
//! use tileproxy::cache::{CacheCapacity, CacheEntry, TileCacheStore};
//!
//! let store = TileCacheStore::new(CacheCapacity::Bytes(512 * 1024 * 1024));
//! store.put(CacheEntry::new(key.clone(), body, "image/png", ttl)).await;
//! let entry = store.get(&key).await;
//! ```

mod negative;
mod store;
mod types;

pub use negative::{NegativeCache, MAX_NEGATIVE_TTL};
pub use store::TileCacheStore;
pub use types::{CacheCapacity, CacheEntry, CacheStats};
