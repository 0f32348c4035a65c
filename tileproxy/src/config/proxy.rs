//! Process-level proxy settings.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use super::error::ConfigError;
use crate::cache::{CacheCapacity, MAX_NEGATIVE_TTL};

/// Default listen address; port 8117 is where the tile service has always run.
pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8117);

/// Default freshness of a cached tile (1 hour).
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Default lifetime of a cached "upstream has no such tile" result (1 minute).
///
/// Kept separate from the positive TTL: a missing tile may appear once the
/// upstream finishes rendering, so it should be re-asked much sooner than a
/// present tile goes stale.
pub const DEFAULT_NEGATIVE_TTL_SECS: u64 = 60;

/// Default tile cache bound (512 MiB of tile bytes).
pub const DEFAULT_CACHE_MAX_BYTES: u64 = 512 * 1024 * 1024;

/// Default bound on remembered missing tiles.
pub const DEFAULT_NEGATIVE_CAPACITY: u64 = 100_000;

/// Settings that come from the environment rather than the provider description.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Address the HTTP surface listens on.
    pub listen_addr: SocketAddr,
    /// Path of the provider description JSON.
    pub providers_path: PathBuf,
    /// Freshness for providers that do not set their own TTL.
    pub default_ttl: Duration,
    /// Freshness of negative results; zero disables negative caching.
    pub negative_ttl: Duration,
    /// Tile cache bound.
    pub cache_capacity: CacheCapacity,
    /// Maximum number of remembered missing tiles.
    pub negative_capacity: u64,
}

impl ProxyConfig {
    /// Create a config with defaults for everything but the provider file.
    pub fn new(providers_path: impl Into<PathBuf>) -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR,
            providers_path: providers_path.into(),
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            negative_ttl: Duration::from_secs(DEFAULT_NEGATIVE_TTL_SECS),
            cache_capacity: CacheCapacity::Bytes(DEFAULT_CACHE_MAX_BYTES),
            negative_capacity: DEFAULT_NEGATIVE_CAPACITY,
        }
    }

    /// Set the listen address.
    pub fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the negative TTL.
    pub fn with_negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = ttl;
        self
    }

    /// Set the cache bound.
    pub fn with_cache_capacity(mut self, capacity: CacheCapacity) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the negative cache bound.
    pub fn with_negative_capacity(mut self, capacity: u64) -> Self {
        self.negative_capacity = capacity;
        self
    }

    /// Reject settings that would make the cache useless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_ttl.is_zero() {
            return Err(ConfigError::InvalidSetting {
                name: "default_ttl",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.negative_ttl > MAX_NEGATIVE_TTL {
            return Err(ConfigError::InvalidSetting {
                name: "negative_ttl",
                reason: format!("must be at most {} seconds", MAX_NEGATIVE_TTL.as_secs()),
            });
        }
        if self.cache_capacity.limit() == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "cache_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
