//! Cache Statistics Module
//!
//! Tracks hit/miss/eviction counters and derives the statistics report and
//! qualitative health assessment.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Process-lifetime performance counters, monotonic until an explicit reset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of lookups served from a fresh entry
    pub hits: u64,
    /// Number of lookups that had to run the computation
    pub misses: u64,
    /// Number of entries removed by capacity-triggered eviction
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Evictions ==
    /// Counts each removed entry once.
    pub fn record_evictions(&mut self, removed: usize) {
        self.evictions += removed as u64;
    }

    // == Reset ==
    /// Zeroes all counters. Only called from an explicit statistics reset,
    /// never from `clear()`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Key Access Summary ==
/// One row of the "most accessed" section of the statistics report.
#[derive(Debug, Clone, Serialize)]
pub struct KeyAccess {
    pub key: String,
    pub access_count: u64,
    pub stored_at: DateTime<Utc>,
}

/// A key paired with its store timestamp, for the oldest/newest extremes.
#[derive(Debug, Clone, Serialize)]
pub struct EntryStamp {
    pub key: String,
    pub stored_at: DateTime<Utc>,
}

// == Cache Report ==
/// Snapshot of counters plus derived figures and per-key access highlights.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// size / max_entries * 100
    pub utilization_pct: f64,
    /// Top-N most accessed keys, most accessed first
    pub top_accessed: Vec<KeyAccess>,
    /// Live entry with the earliest store timestamp
    pub oldest_entry: Option<EntryStamp>,
    /// Live entry with the latest store timestamp
    pub newest_entry: Option<EntryStamp>,
}

/// Converts a unix-millisecond reading into a UTC timestamp for reports.
pub(crate) fn ms_to_datetime(ms: u64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms as i64)
        .single()
        .unwrap_or_default()
}

// == Health ==
/// Qualitative status derived from the hit rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl HealthStatus {
    /// ≥80% Excellent, ≥60% Good, ≥40% Fair, else Poor.
    pub fn from_hit_rate(hit_rate: f64) -> Self {
        if hit_rate >= 0.8 {
            HealthStatus::Excellent
        } else if hit_rate >= 0.6 {
            HealthStatus::Good
        } else if hit_rate >= 0.4 {
            HealthStatus::Fair
        } else {
            HealthStatus::Poor
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            HealthStatus::Excellent => "Excellent",
            HealthStatus::Good => "Good",
            HealthStatus::Fair => "Fair",
            HealthStatus::Poor => "Poor",
        };
        f.write_str(label)
    }
}

/// Health assessment with advisory strings. Advisories are suggestions,
/// never errors.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub hit_rate: f64,
    pub advisories: Vec<String>,
}

impl HealthReport {
    /// Derives the health report from the counters and current occupancy.
    pub fn derive(stats: &CacheStats, total_entries: usize, max_entries: usize) -> Self {
        let hit_rate = stats.hit_rate();
        let mut advisories = Vec::new();

        // Low hit rate is only meaningful once lookups have happened.
        if stats.hits + stats.misses > 0 && hit_rate < 0.4 {
            advisories.push(
                "hit rate below 40%: review key construction or TTL sizing".to_string(),
            );
        }
        if max_entries > 0 && total_entries * 10 >= max_entries * 9 {
            advisories.push(format!(
                "cache at {}/{} entries (>=90% of capacity): consider raising max_entries",
                total_entries, max_entries
            ));
        }
        if stats.evictions > stats.hits {
            advisories.push(
                "evictions exceed hits: working set likely exceeds capacity (thrashing)"
                    .to_string(),
            );
        }

        Self {
            status: HealthStatus::from_hit_rate(hit_rate),
            hit_rate,
            advisories,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_evictions_counts_each_entry() {
        let mut stats = CacheStats::new();
        stats.record_evictions(2);
        stats.record_evictions(3);
        assert_eq!(stats.evictions, 5);
    }

    #[test]
    fn test_reset_zeroes_counters() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_evictions(1);

        stats.reset();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_health_status_bands() {
        assert_eq!(HealthStatus::from_hit_rate(0.95), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_hit_rate(0.8), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_hit_rate(0.79), HealthStatus::Good);
        assert_eq!(HealthStatus::from_hit_rate(0.6), HealthStatus::Good);
        assert_eq!(HealthStatus::from_hit_rate(0.45), HealthStatus::Fair);
        assert_eq!(HealthStatus::from_hit_rate(0.4), HealthStatus::Fair);
        assert_eq!(HealthStatus::from_hit_rate(0.1), HealthStatus::Poor);
    }

    #[test]
    fn test_health_no_traffic_has_no_hit_rate_advisory() {
        let stats = CacheStats::new();
        let report = HealthReport::derive(&stats, 0, 1000);
        assert_eq!(report.status, HealthStatus::Poor);
        assert!(report.advisories.is_empty());
    }

    #[test]
    fn test_health_low_hit_rate_advisory() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_miss();
        stats.record_miss();

        let report = HealthReport::derive(&stats, 10, 1000);
        assert_eq!(report.status, HealthStatus::Poor);
        assert!(report.advisories.iter().any(|a| a.contains("hit rate")));
    }

    #[test]
    fn test_health_capacity_advisory_at_90_pct() {
        let mut stats = CacheStats::new();
        stats.record_hit();

        let report = HealthReport::derive(&stats, 90, 100);
        assert!(report.advisories.iter().any(|a| a.contains("capacity")));

        let report = HealthReport::derive(&stats, 89, 100);
        assert!(!report.advisories.iter().any(|a| a.contains("capacity")));
    }

    #[test]
    fn test_health_thrashing_advisory() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_evictions(5);

        let report = HealthReport::derive(&stats, 1, 1000);
        assert!(report.advisories.iter().any(|a| a.contains("thrashing")));
    }

    #[test]
    fn test_health_status_display() {
        assert_eq!(HealthStatus::Excellent.to_string(), "Excellent");
        assert_eq!(HealthStatus::Poor.to_string(), "Poor");
    }

    #[test]
    fn test_report_serializes() {
        let report = CacheReport {
            hits: 8,
            misses: 2,
            evictions: 0,
            total_entries: 4,
            hit_rate: 0.8,
            utilization_pct: 0.4,
            top_accessed: vec![KeyAccess {
                key: "natal:1990-02-11".to_string(),
                access_count: 5,
                stored_at: ms_to_datetime(1_700_000_000_000),
            }],
            oldest_entry: None,
            newest_entry: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("natal:1990-02-11"));
        assert!(json.contains("hit_rate"));
    }
}
