//! Request coalescing for in-flight tile fetches.
//!
//! When many requests for the same tile arrive while it is being fetched,
//! only the first one goes upstream. Later ones subscribe to the first
//! fetch's broadcast and receive the same outcome.
//!
//! Registration and removal both go through the same DashMap shard lock, so
//! a waiter that subscribed before [`RequestCoalescer::complete`] removed the
//! entry is guaranteed to receive the broadcast.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;

use super::error::FetchOutcome;
use crate::tile::TileKey;

/// Result of registering interest in a tile.
#[derive(Debug)]
pub enum CoalesceResult {
    /// No fetch was in flight; the caller owns the fetch and must finish it
    /// with [`RequestCoalescer::complete`] or [`RequestCoalescer::cancel`].
    NewRequest {
        key: TileKey,
        rx: broadcast::Receiver<FetchOutcome>,
    },
    /// A fetch is already running; wait on the receiver.
    Coalesced(broadcast::Receiver<FetchOutcome>),
}

/// Tracks in-flight fetches by tile key.
#[derive(Debug, Default)]
pub struct RequestCoalescer {
    in_flight: DashMap<TileKey, broadcast::Sender<FetchOutcome>>,
    coalesced: AtomicU64,
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `key`.
    pub fn register(&self, key: &TileKey) -> CoalesceResult {
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                self.coalesced.fetch_add(1, Ordering::Relaxed);
                trace!(tile = %key, "Joined in-flight fetch");
                CoalesceResult::Coalesced(entry.get().subscribe())
            }
            Entry::Vacant(entry) => {
                // Exactly one outcome is ever sent
                let (tx, rx) = broadcast::channel(1);
                entry.insert(tx);
                CoalesceResult::NewRequest {
                    key: key.clone(),
                    rx,
                }
            }
        }
    }

    /// Finish the fetch for `key`, delivering `outcome` to every waiter.
    ///
    /// The registration is removed before broadcasting, so a request arriving
    /// afterwards starts from the cache rather than a finished fetch.
    pub fn complete(&self, key: &TileKey, outcome: FetchOutcome) {
        if let Some((_, tx)) = self.in_flight.remove(key) {
            let waiters = tx.send(outcome).unwrap_or(0);
            trace!(tile = %key, waiters, "Completed in-flight fetch");
        }
    }

    /// Abandon the fetch for `key` without an outcome.
    ///
    /// Waiters observe a closed channel.
    pub fn cancel(&self, key: &TileKey) {
        self.in_flight.remove(key);
    }

    /// Number of fetches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Total number of requests that joined an existing fetch.
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }
}

/// Owner's handle on a registered fetch.
///
/// Cancels the registration if dropped without [`complete`](Self::complete),
/// so a panicking fetch task cannot leave a key stuck in flight.
pub(crate) struct InFlightGuard {
    coalescer: Arc<RequestCoalescer>,
    key: Option<TileKey>,
}

impl InFlightGuard {
    pub(crate) fn new(coalescer: Arc<RequestCoalescer>, key: TileKey) -> Self {
        Self {
            coalescer,
            key: Some(key),
        }
    }

    pub(crate) fn complete(mut self, outcome: FetchOutcome) {
        if let Some(key) = self.key.take() {
            self.coalescer.complete(&key, outcome);
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.coalescer.cancel(&key);
        }
    }
}
