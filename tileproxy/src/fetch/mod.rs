//! Tile resolution: cache lookup, single-flight upstream fetch and retry.
//!
//! - [`FetchCoordinator`]: resolves a [`TileKey`](crate::tile::TileKey) to a
//!   cached or freshly fetched tile
//! - [`RequestCoalescer`]: collapses concurrent fetches of one tile into one
//! - [`RetryPolicy`]: per-provider backoff for transient upstream failures

mod coalescer;
mod coordinator;
mod error;
mod retry;

pub use coalescer::{CoalesceResult, RequestCoalescer};
pub use coordinator::{FetchCoordinator, Resolved, TileSource, DEFAULT_CONTENT_TYPE};
pub use error::{FetchError, FetchErrorKind, FetchOutcome};
pub use retry::RetryPolicy;
