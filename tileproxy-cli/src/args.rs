//! Command-line arguments.
//!
//! Every flag can also be set through its `TILEPROXY_*` environment variable;
//! the flag wins when both are present.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tileproxy::cache::CacheCapacity;
use tileproxy::config::{
    ProxyConfig, DEFAULT_CACHE_MAX_BYTES, DEFAULT_LISTEN_ADDR, DEFAULT_NEGATIVE_TTL_SECS,
    DEFAULT_TTL_SECS,
};

#[derive(Debug, Parser)]
#[command(name = "tileproxy", version, about = "Caching map-tile proxy")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "TILEPROXY_LISTEN", default_value_t = DEFAULT_LISTEN_ADDR)]
    pub listen: SocketAddr,

    /// Provider description file (JSON)
    #[arg(long, env = "TILEPROXY_PROVIDERS", value_name = "FILE")]
    pub providers: PathBuf,

    /// Default tile freshness in seconds
    #[arg(long, env = "TILEPROXY_TTL_SECS", default_value_t = DEFAULT_TTL_SECS)]
    pub ttl_secs: u64,

    /// How long a not-found result is remembered, 0 disables
    #[arg(long, env = "TILEPROXY_NEGATIVE_TTL_SECS", default_value_t = DEFAULT_NEGATIVE_TTL_SECS)]
    pub negative_ttl_secs: u64,

    /// Cache bound in bytes of tile data
    #[arg(long, env = "TILEPROXY_CACHE_MAX_BYTES", default_value_t = DEFAULT_CACHE_MAX_BYTES)]
    pub cache_max_bytes: u64,

    /// Cache bound in number of tiles (overrides --cache-max-bytes)
    #[arg(long, env = "TILEPROXY_CACHE_MAX_ENTRIES")]
    pub cache_max_entries: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "TILEPROXY_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. "info" or "tileproxy=debug"
    #[arg(long, env = "TILEPROXY_LOG")]
    pub log_level: Option<String>,
}

impl Args {
    /// Proxy configuration described by these arguments.
    pub fn to_config(&self) -> ProxyConfig {
        let capacity = match self.cache_max_entries {
            Some(entries) => CacheCapacity::Entries(entries),
            None => CacheCapacity::Bytes(self.cache_max_bytes),
        };

        ProxyConfig::new(&self.providers)
            .with_listen_addr(self.listen)
            .with_default_ttl(Duration::from_secs(self.ttl_secs))
            .with_negative_ttl(Duration::from_secs(self.negative_ttl_secs))
            .with_cache_capacity(capacity)
    }
}
