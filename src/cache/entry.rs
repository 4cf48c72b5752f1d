//! Cache Entry Module
//!
//! Defines the structure for individual cached calculation results.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single cached calculation result with its freshness metadata.
///
/// The TTL resolved at store time is kept on the entry, so a later read with
/// a different classification hint does not move the entry's expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The computed result
    pub value: V,
    /// Timestamp the entry was written (Unix milliseconds)
    pub stored_at: u64,
    /// Effective TTL resolved when the entry was stored
    pub ttl: Duration,
    /// Number of hits served from this entry since it was (re)stored
    pub access_count: u64,
    /// Monotonic store sequence, used for dependency-order comparison.
    /// Strictly larger means stored more recently, even within one
    /// millisecond.
    pub stored_seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a fresh entry. The access count starts at a zero baseline,
    /// also on overwrite of an existing key.
    pub fn new(value: V, ttl: Duration, stored_seq: u64) -> Self {
        Self {
            value,
            stored_at: current_timestamp_ms(),
            ttl,
            access_count: 0,
            stored_seq,
        }
    }

    // == Freshness ==
    /// Age of the entry relative to the supplied clock reading.
    pub fn age_at(&self, now_ms: u64) -> Duration {
        Duration::from_millis(now_ms.saturating_sub(self.stored_at))
    }

    /// An entry is expired once its age reaches its stored TTL.
    ///
    /// Boundary condition: expired when `age >= ttl`, so a zero TTL entry
    /// is stale immediately.
    pub fn is_expired(&self) -> bool {
        self.is_older_than(self.ttl)
    }

    /// Checks the entry's age against an arbitrary reference TTL. Used by
    /// the approximate expiry sweep, which deliberately ignores each
    /// entry's own TTL class.
    pub fn is_older_than(&self, reference_ttl: Duration) -> bool {
        self.age_at(current_timestamp_ms()) >= reference_ttl
    }

    /// Remaining time before expiry, saturating at zero.
    pub fn ttl_remaining(&self) -> Duration {
        self.ttl
            .saturating_sub(self.age_at(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
