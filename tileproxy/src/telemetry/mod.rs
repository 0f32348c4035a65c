//! Proxy telemetry for observability.
//!
//! This module provides metrics collection for the tile fetch path. It uses
//! lock-free atomic counters so instrumentation costs next to nothing on the
//! hot path.
//!
//! # Architecture
//!
//! ```text
//! Fetch Coordinator ─────► ProxyMetrics ─────► TelemetrySnapshot ─────► /stats
//!                          (atomic counters)   (point-in-time copy)
//! ```
//!
//! # Example
//!
//! ```
//! use tileproxy::telemetry::ProxyMetrics;
//!
//! let metrics = ProxyMetrics::new();
//! metrics.request();
//! metrics.cache_hit();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.cache_hits, 1);
//! ```

mod metrics;
mod snapshot;

pub use metrics::ProxyMetrics;
pub use snapshot::TelemetrySnapshot;
