//! TileProxy - caching, coalescing proxy for slippy-map tile servers
//!
//! Clients request tiles as `/tiles/{provider}/{z}/{x}/{y}`; the proxy
//! serves them from a bounded in-memory cache, fetching from the configured
//! upstream on a miss. Concurrent requests for the same missing tile share a
//! single upstream fetch.

pub mod app;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod provider;
pub mod server;
pub mod telemetry;
pub mod tile;

/// Service name reported by the health and info endpoints.
pub const SERVICE_NAME: &str = "tileproxy";

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
