//! Calculation Cache Module
//!
//! The memoization/eviction engine fronting expensive astrological
//! calculation calls: TTL classes resolved from data classification, banded
//! LRU eviction under capacity pressure, dependency and pattern
//! invalidation, and statistics/health reporting.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::Mutex;

use crate::cache::entry::CacheEntry;
use crate::cache::lru::AccessOrder;
use crate::cache::stats::{
    ms_to_datetime, CacheReport, CacheStats, EntryStamp, HealthReport, KeyAccess,
};
use crate::cache::{
    EMERGENCY_EVICTION_FRACTION, MAX_KEY_LENGTH, PROACTIVE_CAPACITY_FRACTION,
    PROACTIVE_EVICTION_FRACTION,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::logging::{CacheLogger, LogLevel, TracingLogger};

/// How many most-accessed keys a report carries when the caller does not say.
pub const DEFAULT_TOP_ACCESSED: usize = 10;

// == Data Classification ==
/// Classification hint for a calculation result, used to pick a TTL class
/// when no explicit TTL is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataClass {
    /// Drifting values such as planetary positions. Resolves to `ttl_short`.
    #[default]
    Volatile,
    /// Partner/shared calculation data such as compatibility scores or
    /// nakshatra lookups. Resolves to `ttl_default`.
    Partner,
    /// The user's own stable data such as fixed birth data or dasha
    /// periods. Resolves to `ttl_long`.
    User,
}

// == Cache Policy ==
/// TTL resolution input for one get-or-compute call.
///
/// An explicit TTL always wins; otherwise the data class picks one of the
/// three configured TTL constants.
#[derive(Debug, Clone, Copy, Default)]
pub struct CachePolicy {
    /// Explicit TTL override
    pub ttl: Option<Duration>,
    /// Classification used when no override is given
    pub class: DataClass,
}

impl CachePolicy {
    /// Policy for unclassified, drifting data (`ttl_short`).
    pub fn volatile() -> Self {
        Self::default()
    }

    /// Policy for partner/shared calculation data (`ttl_default`).
    pub fn partner() -> Self {
        Self {
            ttl: None,
            class: DataClass::Partner,
        }
    }

    /// Policy for the user's own stable data (`ttl_long`).
    pub fn user() -> Self {
        Self {
            ttl: None,
            class: DataClass::User,
        }
    }

    /// Policy with an explicit TTL, overriding any classification.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            class: DataClass::Volatile,
        }
    }

    /// Resolves the effective TTL against the configured TTL classes.
    pub fn resolve(&self, config: &CacheConfig) -> Duration {
        match self.ttl {
            Some(ttl) => ttl,
            None => match self.class {
                DataClass::User => config.ttl_long,
                DataClass::Partner => config.ttl_default,
                DataClass::Volatile => config.ttl_short,
            },
        }
    }
}

// == Internal State ==
/// Bookkeeping guarded by one lock: entry table, access order, counters.
/// Never held across a caller's compute future.
#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: AccessOrder,
    stats: CacheStats,
    /// Monotonic store counter backing dependency-order comparison
    store_seq: u64,
}

impl<V> CacheState<V> {
    fn remove_entry(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.order.remove(key);
        removed
    }
}

// == Calculation Cache ==
/// In-process memoization cache for calculation results of type `V`.
///
/// One instance per result family; a key must never be reused across two
/// result types (with typed instances the compiler enforces this). The
/// cache is an explicit object — construct it at the composition root and
/// share it as `Arc<CalculationCache<V>>`.
///
/// Concurrent callers for the same unresolved key share a single in-flight
/// computation (single-flight): the first caller runs `compute`, the rest
/// await it and are served from the stored result.
pub struct CalculationCache<V> {
    state: Mutex<CacheState<V>>,
    /// Per-key in-flight computation guards
    flights: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    config: CacheConfig,
    logger: Arc<dyn CacheLogger>,
}

impl<V: Clone> CalculationCache<V> {
    // == Constructors ==
    /// Creates a cache with the given configuration, logging through
    /// `tracing`.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_logger(config, Arc::new(TracingLogger))
    }

    /// Creates a cache with an injected logging collaborator.
    pub fn with_logger(config: CacheConfig, logger: Arc<dyn CacheLogger>) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: AccessOrder::new(),
                stats: CacheStats::new(),
                store_seq: 0,
            }),
            flights: Mutex::new(HashMap::new()),
            config,
            logger,
        }
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Get Or Compute ==
    /// Returns the cached value for `key` if still fresh, otherwise runs
    /// `compute`, stores its result under the TTL resolved from `policy`,
    /// and returns it.
    ///
    /// The resolved TTL is stored on the entry: a later call with a
    /// different policy does not move an existing entry's expiry, it only
    /// takes effect when the entry is next (re)stored.
    ///
    /// Failures of `compute` are propagated unchanged and never cached.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        policy: CachePolicy,
        compute: F,
    ) -> CacheResult<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: std::error::Error,
    {
        validate_key(key)?;

        // Fast path: fresh entry, no flight bookkeeping needed.
        if let Some(value) = self.lookup(key).await {
            return Ok(value);
        }

        // Single-flight: one leader computes, concurrent callers for the
        // same key queue on the flight guard.
        let flight = self.flight_for(key).await;
        let guard = flight.lock().await;

        // Re-check: the previous leader may have stored while we waited.
        if let Some(value) = self.lookup(key).await {
            drop(guard);
            self.release_flight(key, &flight).await;
            return Ok(value);
        }

        // We are the leader. The miss is recorded at the point the
        // computation becomes unavoidable.
        {
            let mut state = self.state.lock().await;
            state.stats.record_miss();
        }
        self.logger.log(
            LogLevel::Debug,
            "cache miss, computing",
            Some(&json!({ "key": key })),
        );

        let outcome = compute().await;
        let result = match outcome {
            Ok(value) => {
                let ttl = policy.resolve(&self.config);
                self.store_value(key, value.clone(), ttl).await;
                Ok(value)
            }
            Err(err) => {
                // A failed computation leaves no mark in the store; the
                // next caller for this key becomes a fresh leader.
                self.logger.log(
                    LogLevel::Error,
                    "calculation failed, result not cached",
                    Some(&json!({ "key": key, "error": err.to_string() })),
                );
                Err(CacheError::Compute(err))
            }
        };

        drop(guard);
        self.release_flight(key, &flight).await;
        result
    }

    /// Synchronous-closure variant of [`get_or_compute`], for callers whose
    /// computation does not await anything.
    ///
    /// [`get_or_compute`]: CalculationCache::get_or_compute
    pub async fn get_or_compute_sync<F, E>(
        &self,
        key: &str,
        policy: CachePolicy,
        compute: F,
    ) -> CacheResult<V, E>
    where
        F: FnOnce() -> Result<V, E>,
        E: std::error::Error,
    {
        self.get_or_compute(key, policy, || std::future::ready(compute()))
            .await
    }

    // == Get Or Compute With Dependencies ==
    /// Like [`get_or_compute`], but first invalidates `key` if any of the
    /// `dependencies` keys was stored strictly more recently than `key`
    /// itself.
    ///
    /// This is the coarse "upstream input changed" rule used for chains
    /// like birth-data → compatibility. It is time-based, not value-based.
    ///
    /// [`get_or_compute`]: CalculationCache::get_or_compute
    pub async fn get_or_compute_with_dependencies<F, Fut, E>(
        &self,
        key: &str,
        dependencies: &[&str],
        policy: CachePolicy,
        compute: F,
    ) -> CacheResult<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: std::error::Error,
    {
        validate_key(key)?;

        let stale_dependency = {
            let mut state = self.state.lock().await;
            let own_seq = state.entries.get(key).map(|e| e.stored_seq);
            match own_seq {
                Some(own_seq) => {
                    let newer = dependencies.iter().any(|dep| {
                        state
                            .entries
                            .get(*dep)
                            .is_some_and(|d| d.stored_seq > own_seq)
                    });
                    if newer {
                        state.remove_entry(key);
                    }
                    newer
                }
                None => false,
            }
        };
        if stale_dependency {
            self.logger.log(
                LogLevel::Debug,
                "dependency stored more recently, entry invalidated",
                Some(&json!({ "key": key })),
            );
        }

        self.get_or_compute(key, policy, compute).await
    }

    // == Get Or Compute Conditional ==
    /// Like [`get_or_compute`], but first invalidates `key` if the caller's
    /// predicate says so. The predicate runs synchronously before any
    /// asynchronous work.
    ///
    /// [`get_or_compute`]: CalculationCache::get_or_compute
    pub async fn get_or_compute_if<P, F, Fut, E>(
        &self,
        key: &str,
        should_invalidate: P,
        policy: CachePolicy,
        compute: F,
    ) -> CacheResult<V, E>
    where
        P: FnOnce() -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: std::error::Error,
    {
        validate_key(key)?;

        if should_invalidate() {
            let mut state = self.state.lock().await;
            state.remove_entry(key);
        }

        self.get_or_compute(key, policy, compute).await
    }

    // == Invalidate ==
    /// Removes the entry unconditionally. Idempotent on absent keys.
    /// Returns whether an entry was removed.
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;
        state.remove_entry(key)
    }

    // == Invalidate By Pattern ==
    /// Removes every entry whose key contains `pattern`. Returns the
    /// number of entries removed. Intended for coarse bulk invalidation,
    /// e.g. clearing one calculation domain.
    pub async fn invalidate_by_pattern(&self, pattern: &str) -> usize {
        let removed = {
            let mut state = self.state.lock().await;
            let matching: Vec<String> = state
                .entries
                .keys()
                .filter(|k| k.contains(pattern))
                .cloned()
                .collect();
            for key in &matching {
                state.remove_entry(key);
            }
            matching.len()
        };
        if removed > 0 {
            self.logger.log(
                LogLevel::Info,
                "invalidated entries by pattern",
                Some(&json!({ "pattern": pattern, "removed": removed })),
            );
        }
        removed
    }

    // == Sweep Expired ==
    /// Removes every entry older than `reference_ttl` (defaults to the
    /// configured `ttl_default`), regardless of the TTL class each entry
    /// was stored under. A conservative, approximate cleanup pass — exact
    /// expiry is enforced at read time.
    pub async fn sweep_expired(&self, reference_ttl: Option<Duration>) -> usize {
        let ttl = reference_ttl.unwrap_or(self.config.ttl_default);
        let removed = {
            let mut state = self.state.lock().await;
            let stale: Vec<String> = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_older_than(ttl))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &stale {
                state.remove_entry(key);
            }
            stale.len()
        };
        if removed > 0 {
            self.logger.log(
                LogLevel::Info,
                "expiry sweep removed entries",
                Some(&json!({ "removed": removed, "reference_ttl_secs": ttl.as_secs() })),
            );
        }
        removed
    }

    // == Clear ==
    /// Removes all entries and access bookkeeping. Statistics counters are
    /// preserved; reset them with [`reset_statistics`].
    ///
    /// [`reset_statistics`]: CalculationCache::reset_statistics
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.order.clear();
        self.logger.log(LogLevel::Info, "cache cleared", None);
    }

    // == Reset Statistics ==
    /// Zeroes the hit/miss/eviction counters.
    pub async fn reset_statistics(&self) {
        let mut state = self.state.lock().await;
        state.stats.reset();
    }

    // == Statistics ==
    /// Builds the statistics report: counters, hit rate, utilization, the
    /// `top_n` most-accessed keys (default 10), and the oldest/newest live
    /// entries by store timestamp.
    pub async fn statistics(&self, top_n: Option<usize>) -> CacheReport {
        let top_n = top_n.unwrap_or(DEFAULT_TOP_ACCESSED);
        let state = self.state.lock().await;

        let mut ranked: Vec<(&String, &CacheEntry<V>)> = state.entries.iter().collect();
        ranked.sort_by(|(ka, a), (kb, b)| {
            b.access_count
                .cmp(&a.access_count)
                .then_with(|| ka.cmp(kb))
        });
        let top_accessed = ranked
            .iter()
            .take(top_n)
            .map(|(key, entry)| KeyAccess {
                key: (*key).clone(),
                access_count: entry.access_count,
                stored_at: ms_to_datetime(entry.stored_at),
            })
            .collect();

        let oldest_entry = state
            .entries
            .iter()
            .min_by_key(|(_, e)| (e.stored_at, e.stored_seq))
            .map(|(key, e)| EntryStamp {
                key: key.clone(),
                stored_at: ms_to_datetime(e.stored_at),
            });
        let newest_entry = state
            .entries
            .iter()
            .max_by_key(|(_, e)| (e.stored_at, e.stored_seq))
            .map(|(key, e)| EntryStamp {
                key: key.clone(),
                stored_at: ms_to_datetime(e.stored_at),
            });

        let total_entries = state.entries.len();
        let utilization_pct = if self.config.max_entries == 0 {
            0.0
        } else {
            total_entries as f64 / self.config.max_entries as f64 * 100.0
        };

        CacheReport {
            hits: state.stats.hits,
            misses: state.stats.misses,
            evictions: state.stats.evictions,
            total_entries,
            hit_rate: state.stats.hit_rate(),
            utilization_pct,
            top_accessed,
            oldest_entry,
            newest_entry,
        }
    }

    // == Health ==
    /// Derives the qualitative health assessment from the current counters
    /// and occupancy.
    pub async fn health(&self) -> HealthReport {
        let state = self.state.lock().await;
        HealthReport::derive(&state.stats, state.entries.len(), self.config.max_entries)
    }

    // == Length ==
    /// Current number of live entries.
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.entries.is_empty()
    }

    // -- private helpers ---------------------------------------------------

    /// Fresh-entry lookup. On a valid hit: bumps the entry's access count,
    /// touches the access order, records the hit, returns a clone. An
    /// expired entry is removed on the spot (expire-on-read) and reads as
    /// absent; read-time expiries are not counted as evictions.
    async fn lookup(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock().await;
        let expired = state.entries.get(key).map(|e| e.is_expired());
        match expired {
            Some(true) => {
                state.remove_entry(key);
                self.logger.log(
                    LogLevel::Debug,
                    "entry expired on read",
                    Some(&json!({ "key": key })),
                );
                None
            }
            Some(false) => {
                let entry = state.entries.get_mut(key)?;
                entry.access_count += 1;
                let value = entry.value.clone();
                state.order.touch(key);
                state.stats.record_hit();
                Some(value)
            }
            None => None,
        }
    }

    /// Stores a computed value, running the eviction bands first when the
    /// key is new. The key being stored is inserted after eviction runs and
    /// is therefore never an eviction candidate.
    async fn store_value(&self, key: &str, value: V, ttl: Duration) {
        let mut state = self.state.lock().await;

        let is_overwrite = state.entries.contains_key(key);
        if !is_overwrite {
            self.apply_eviction_bands(&mut state);
        }

        state.store_seq += 1;
        let seq = state.store_seq;
        state
            .entries
            .insert(key.to_string(), CacheEntry::new(value, ttl, seq));
        state.order.touch(key);
    }

    /// Capacity bands, checked against the pre-insert size:
    /// at or past full capacity evict the LRU 30% (emergency), at or past
    /// 80% evict the LRU 20% (proactive). A final guard keeps the
    /// post-insert size within capacity even in degenerate configurations
    /// (`max_entries` of 0 degrades to holding only the newest entry).
    fn apply_eviction_bands(&self, state: &mut CacheState<V>) {
        let len = state.entries.len();
        let max = self.config.max_entries;
        let effective_max = max.max(1);

        let band_count = if len >= effective_max {
            ceil_fraction(len, EMERGENCY_EVICTION_FRACTION)
        } else if max > 0 && len >= ceil_fraction(max, PROACTIVE_CAPACITY_FRACTION) {
            ceil_fraction(len, PROACTIVE_EVICTION_FRACTION)
        } else {
            0
        };

        let mut evicted = self.evict_oldest(state, band_count);

        // Capacity anomaly guard: the banded cut must leave room for the
        // incoming entry.
        while state.entries.len() >= effective_max {
            evicted += self.evict_oldest(state, 1);
        }

        if evicted > 0 {
            self.logger.log(
                LogLevel::Info,
                "evicted least-recently-used entries",
                Some(&json!({ "evicted": evicted, "remaining": state.entries.len() })),
            );
        }
    }

    /// Removes up to `count` entries from the LRU end, counting each one.
    fn evict_oldest(&self, state: &mut CacheState<V>, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        let victims = state.order.take_oldest(count);
        for key in &victims {
            state.entries.remove(key);
        }
        state.stats.record_evictions(victims.len());
        victims.len()
    }

    /// Returns the flight guard for `key`, creating it on first use.
    async fn flight_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut flights = self.flights.lock().await;
        flights
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the flight table entry once no other caller is queued on it.
    /// Two references remain when we are last: the table's and ours.
    async fn release_flight(&self, key: &str, flight: &Arc<Mutex<()>>) {
        let mut flights = self.flights.lock().await;
        if Arc::strong_count(flight) <= 2 {
            flights.remove(key);
        }
    }
}

/// Fail-fast key precondition: non-empty and within the length bound.
fn validate_key<E: std::error::Error>(key: &str) -> CacheResult<(), E> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

/// `ceil(len * fraction)` as an entry count.
fn ceil_fraction(len: usize, fraction: f64) -> usize {
    (len as f64 * fraction).ceil() as usize
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::stats::HealthStatus;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config(max_entries: usize) -> CacheConfig {
        CacheConfig {
            max_entries,
            ..CacheConfig::default()
        }
    }

    fn test_cache(max_entries: usize) -> CalculationCache<String> {
        CalculationCache::with_logger(test_config(max_entries), Arc::new(crate::NoopLogger))
    }

    async fn seed(cache: &CalculationCache<String>, key: &str, value: &str) {
        let value = value.to_string();
        cache
            .get_or_compute::<_, _, io::Error>(key, CachePolicy::volatile(), || async {
                Ok(value)
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_miss_then_hit_computes_once() {
        let cache = test_cache(100);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .get_or_compute::<_, _, io::Error>("natal:1990", CachePolicy::user(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("chart".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "chart");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let report = cache.statistics(None).await;
        assert_eq!(report.misses, 1);
        assert_eq!(report.hits, 1);
    }

    #[tokio::test]
    async fn test_expiry_recomputes() {
        let cache = test_cache(100);
        let calls = AtomicUsize::new(0);
        let policy = CachePolicy::with_ttl(Duration::from_millis(20));

        for _ in 0..2 {
            cache
                .get_or_compute::<_, _, io::Error>("transit:now", policy, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("positions".to_string())
                })
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_explicit_ttl_overrides_class() {
        let cache = test_cache(100);
        let policy = CachePolicy {
            ttl: Some(Duration::from_millis(20)),
            class: DataClass::User,
        };
        seed_with_policy(&cache, "k", policy).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The user class would keep this fresh for 30 days; the explicit
        // override must win.
        let calls = AtomicUsize::new(0);
        cache
            .get_or_compute::<_, _, io::Error>("k", policy, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("v".to_string())
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    async fn seed_with_policy(cache: &CalculationCache<String>, key: &str, policy: CachePolicy) {
        cache
            .get_or_compute::<_, _, io::Error>(key, policy, || async { Ok("v".to_string()) })
            .await
            .unwrap();
    }

    #[test]
    fn test_policy_resolution_order() {
        let config = CacheConfig::default();

        assert_eq!(CachePolicy::volatile().resolve(&config), config.ttl_short);
        assert_eq!(CachePolicy::partner().resolve(&config), config.ttl_default);
        assert_eq!(CachePolicy::user().resolve(&config), config.ttl_long);

        let explicit = CachePolicy {
            ttl: Some(Duration::from_secs(7)),
            class: DataClass::User,
        };
        assert_eq!(explicit.resolve(&config), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_empty_key_fails_fast() {
        let cache = test_cache(100);
        let calls = AtomicUsize::new(0);

        let result = cache
            .get_or_compute::<_, _, io::Error>("", CachePolicy::volatile(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("v".to_string())
            })
            .await;

        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0, "compute must not run");
    }

    #[tokio::test]
    async fn test_overlong_key_fails_fast() {
        let cache = test_cache(100);
        let key = "x".repeat(MAX_KEY_LENGTH + 1);

        let result = cache
            .get_or_compute::<_, _, io::Error>(&key, CachePolicy::volatile(), || async {
                Ok("v".to_string())
            })
            .await;
        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_compute_failure_propagates_and_is_not_cached() {
        let cache = test_cache(100);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let result = cache
                .get_or_compute::<_, _, io::Error>("dasha:x", CachePolicy::user(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(io::Error::new(io::ErrorKind::TimedOut, "service down"))
                })
                .await;
            match result {
                Err(CacheError::Compute(e)) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
                other => panic!("expected compute error, got {other:?}"),
            }
        }

        // Both attempts computed; nothing was ever stored.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty().await);
        let report = cache.statistics(None).await;
        assert_eq!(report.misses, 2);
        assert_eq!(report.hits, 0);
    }

    #[tokio::test]
    async fn test_single_flight_deduplicates_concurrent_callers() {
        let cache = Arc::new(test_cache(100));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute::<_, _, io::Error>(
                        "kundali:shared",
                        CachePolicy::partner(),
                        || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(30)).await;
                            Ok("match".to_string())
                        },
                    )
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "match");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1, "leader computes once");

        let report = cache.statistics(None).await;
        assert_eq!(report.misses, 1);
        assert_eq!(report.hits, 4);
    }

    #[tokio::test]
    async fn test_failed_leader_leaves_no_flight_behind() {
        let cache = test_cache(100);

        let failed = cache
            .get_or_compute::<_, _, io::Error>("k", CachePolicy::volatile(), || async {
                Err(io::Error::other("boom"))
            })
            .await;
        assert!(failed.is_err());

        // A subsequent caller becomes a fresh leader and succeeds.
        seed(&cache, "k", "recovered").await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.flights.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_dependency_invalidation() {
        let cache = test_cache(100);
        seed(&cache, "birth:a", "chart-a").await;
        seed(&cache, "compat:a:b", "score-1").await;

        // Re-store the parent so it is strictly newer than the child.
        cache.invalidate("birth:a").await;
        seed(&cache, "birth:a", "chart-a2").await;

        let calls = AtomicUsize::new(0);
        let value = cache
            .get_or_compute_with_dependencies::<_, _, io::Error>(
                "compat:a:b",
                &["birth:a"],
                CachePolicy::partner(),
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("score-2".to_string())
                },
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1, "stale-by-dependency");
        assert_eq!(value, "score-2");
    }

    #[tokio::test]
    async fn test_dependency_not_newer_is_a_hit() {
        let cache = test_cache(100);
        seed(&cache, "birth:a", "chart-a").await;
        seed(&cache, "compat:a:b", "score-1").await;

        let calls = AtomicUsize::new(0);
        let value = cache
            .get_or_compute_with_dependencies::<_, _, io::Error>(
                "compat:a:b",
                &["birth:a"],
                CachePolicy::partner(),
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("score-2".to_string())
                },
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(value, "score-1");
    }

    #[tokio::test]
    async fn test_conditional_invalidation() {
        let cache = test_cache(100);
        seed(&cache, "panchanga:today", "old").await;

        let value = cache
            .get_or_compute_if::<_, _, _, io::Error>(
                "panchanga:today",
                || true,
                CachePolicy::volatile(),
                || async { Ok("new".to_string()) },
            )
            .await
            .unwrap();
        assert_eq!(value, "new");

        let value = cache
            .get_or_compute_if::<_, _, _, io::Error>(
                "panchanga:today",
                || false,
                CachePolicy::volatile(),
                || async { Ok("never".to_string()) },
            )
            .await
            .unwrap();
        assert_eq!(value, "new");
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let cache = test_cache(100);
        seed(&cache, "k", "v").await;

        assert!(cache.invalidate("k").await);
        assert!(!cache.invalidate("k").await);
        assert!(!cache.invalidate("absent").await);
    }

    #[tokio::test]
    async fn test_invalidate_by_pattern() {
        let cache = test_cache(100);
        seed(&cache, "compat_A_B", "1").await;
        seed(&cache, "compat_A_C", "2").await;
        seed(&cache, "nakshatra_A", "3").await;

        let removed = cache.invalidate_by_pattern("compat_A").await;
        assert_eq!(removed, 2);
        assert_eq!(cache.len().await, 1);
        assert!(!cache.invalidate("compat_A_B").await);
        assert!(cache.invalidate("nakshatra_A").await);
    }

    #[tokio::test]
    async fn test_sweep_expired_uses_reference_ttl() {
        let cache = test_cache(100);
        // Stored under the long class: fresh by its own TTL.
        seed_with_policy(&cache, "birth:a", CachePolicy::user()).await;
        seed_with_policy(&cache, "birth:b", CachePolicy::user()).await;

        // Against a zero reference TTL everything is stale — that is the
        // documented approximation.
        tokio::time::sleep(Duration::from_millis(5)).await;
        let removed = cache.sweep_expired(Some(Duration::ZERO)).await;
        assert_eq!(removed, 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_sweep_expired_default_keeps_fresh_entries() {
        let cache = test_cache(100);
        seed(&cache, "k", "v").await;

        let removed = cache.sweep_expired(None).await;
        assert_eq!(removed, 0);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear_preserves_counters() {
        let cache = test_cache(100);
        seed(&cache, "k", "v").await;
        seed(&cache, "k", "v").await; // hit

        cache.clear().await;
        cache.clear().await; // idempotent

        assert!(cache.is_empty().await);
        let report = cache.statistics(None).await;
        assert_eq!(report.misses, 1);
        assert_eq!(report.hits, 1);

        cache.reset_statistics().await;
        let report = cache.statistics(None).await;
        assert_eq!(report.misses, 0);
        assert_eq!(report.hits, 0);
    }

    #[tokio::test]
    async fn test_proactive_eviction_band() {
        // max 5: the proactive band arms at ceil(0.8 * 5) = 4 entries.
        let cache = test_cache(5);
        for i in 0..4 {
            seed(&cache, &format!("k{i}"), "v").await;
        }

        seed(&cache, "k4", "v").await;

        // Pre-insert size 4 tripped the band: ceil(0.2 * 4) = 1 eviction,
        // the oldest-touched key.
        let report = cache.statistics(None).await;
        assert_eq!(report.evictions, 1);
        assert_eq!(report.total_entries, 4);
        assert!(!cache.invalidate("k0").await, "k0 was the LRU victim");
    }

    #[tokio::test]
    async fn test_overwrite_does_not_trigger_eviction() {
        let cache = test_cache(5);
        for i in 0..4 {
            seed(&cache, &format!("k{i}"), "v").await;
        }

        // Overwriting an existing key at the band threshold: size does not
        // grow, so the bands stay quiet.
        cache
            .store_value("k1", "v2".to_string(), Duration::from_secs(60))
            .await;

        let report = cache.statistics(None).await;
        assert_eq!(report.total_entries, 4);
        assert_eq!(report.evictions, 0);
    }

    #[tokio::test]
    async fn test_access_count_resets_on_overwrite() {
        let cache = test_cache(100);
        seed(&cache, "k", "v").await;
        seed(&cache, "k", "v").await; // hit: access_count 1

        cache
            .store_value("k", "v2".to_string(), Duration::from_secs(60))
            .await;

        let report = cache.statistics(None).await;
        let top = &report.top_accessed[0];
        assert_eq!(top.key, "k");
        assert_eq!(top.access_count, 0, "fresh baseline after re-store");
    }

    #[tokio::test]
    async fn test_zero_capacity_keeps_only_newest() {
        let cache = test_cache(0);
        seed(&cache, "first", "1").await;
        seed(&cache, "second", "2").await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.invalidate("second").await);
        assert!(!cache.invalidate("first").await);
    }

    #[tokio::test]
    async fn test_statistics_top_n_and_extremes() {
        let cache = test_cache(100);
        seed(&cache, "a", "1").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        seed(&cache, "b", "2").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        seed(&cache, "c", "3").await;

        // Three hits on b, one on c.
        for _ in 0..3 {
            seed(&cache, "b", "2").await;
        }
        seed(&cache, "c", "3").await;

        let report = cache.statistics(Some(2)).await;
        assert_eq!(report.top_accessed.len(), 2);
        assert_eq!(report.top_accessed[0].key, "b");
        assert_eq!(report.top_accessed[0].access_count, 3);
        assert_eq!(report.top_accessed[1].key, "c");
        assert_eq!(report.oldest_entry.as_ref().unwrap().key, "a");
        assert_eq!(report.newest_entry.as_ref().unwrap().key, "c");
        assert_eq!(report.total_entries, 3);
        assert!((report.utilization_pct - 3.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_health_reflects_hit_rate() {
        let cache = test_cache(100);
        seed(&cache, "k", "v").await; // miss
        for _ in 0..4 {
            seed(&cache, "k", "v").await; // hits
        }

        let health = cache.health().await;
        assert_eq!(health.status, HealthStatus::Excellent);
        assert!(health.advisories.is_empty());
    }

    #[test]
    fn test_get_or_compute_sync_shape() {
        tokio_test::block_on(async {
            let cache = test_cache(100);
            let value = cache
                .get_or_compute_sync::<_, io::Error>("rashi:moon", CachePolicy::partner(), || {
                    Ok("karka".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "karka");
            assert_eq!(cache.len().await, 1);
        });
    }
}
