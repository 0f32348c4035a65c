//! Startup configuration.
//!
//! Two sources feed the proxy: the provider description file (JSON, one record
//! per upstream) and process settings such as the listen address and cache
//! bounds. Both are validated completely before the proxy starts serving.

mod error;
mod providers;
mod proxy;

pub use error::ConfigError;
pub use providers::{load_registry, parse_providers};
pub use proxy::{
    ProxyConfig, DEFAULT_CACHE_MAX_BYTES, DEFAULT_LISTEN_ADDR, DEFAULT_NEGATIVE_CAPACITY,
    DEFAULT_NEGATIVE_TTL_SECS, DEFAULT_TTL_SECS,
};
