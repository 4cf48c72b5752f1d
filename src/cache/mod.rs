//! Cache Module
//!
//! The in-process calculation cache: TTL classes, LRU access tracking,
//! banded capacity eviction, and statistics/health reporting.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::AccessOrder;
pub use stats::{CacheReport, CacheStats, EntryStamp, HealthReport, HealthStatus, KeyAccess};
pub use store::{CachePolicy, CalculationCache, DataClass, DEFAULT_TOP_ACCESSED};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Occupancy fraction of capacity at which proactive eviction arms
pub const PROACTIVE_CAPACITY_FRACTION: f64 = 0.8;

/// Fraction of the cache evicted by a proactive pass
pub const PROACTIVE_EVICTION_FRACTION: f64 = 0.2;

/// Fraction of the cache evicted by an emergency pass at full capacity
pub const EMERGENCY_EVICTION_FRACTION: f64 = 0.3;
