//! Background Sweep Task
//!
//! Periodically walks the cache and drops entries older than the
//! configured default TTL, so stale results do not sit in memory waiting
//! for a read to notice them. The sweep is the approximate reference-TTL
//! pass; exact per-entry expiry is enforced at read time.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use crate::cache::CalculationCache;

// == Sweep Task ==
/// Spawns the periodic expiry sweep for `cache`.
///
/// Runs every `period`, removing entries older than the cache's default
/// TTL. The returned handle can be aborted on shutdown; the task holds
/// its own `Arc` and otherwise runs for the life of the runtime.
pub fn spawn_sweep_task<V>(
    cache: Arc<CalculationCache<V>>,
    period: Duration,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(period_secs = period.as_secs(), "Expiry sweep task started");
        let mut ticker = interval(period);
        // The first tick completes immediately; skip it so the initial
        // sweep happens one full period after startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = cache.sweep_expired(None).await;
            if removed > 0 {
                info!(removed, "Expiry sweep removed stale entries");
            } else {
                debug!("Expiry sweep found nothing to remove");
            }
        }
    })
}
