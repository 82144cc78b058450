//! Expiry Sweep Task
//!
//! Background task that samples in-memory entries at random and removes the
//! expired ones, the way Redis expires keys actively.

use std::sync::Weak;
use std::time::Instant;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::cache::ExpiringStore;
use crate::config::SweepConfig;

/// Spawns the sampling sweep for one in-memory cache.
///
/// Every `config.interval` the task samples `config.samples` random entries
/// and deletes the expired ones. While a pass finds at least
/// `config.recheck_threshold()` expired samples another pass runs at once,
/// bounded by a time budget of a quarter of the interval.
///
/// The task only holds a `Weak` handle and exits once the cache is dropped.
///
/// # Returns
/// A JoinHandle the owning cache aborts when closed.
pub fn spawn_sweep_task<V>(
    store: Weak<RwLock<ExpiringStore<V>>>,
    config: SweepConfig,
) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    let threshold = config.recheck_threshold();
    let budget = config.interval / 4;

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep: interval={:?}, samples={}, recheck_threshold={}",
            config.interval, config.samples, threshold
        );

        loop {
            tokio::time::sleep(config.interval).await;

            let Some(store) = store.upgrade() else {
                debug!("Expiry sweep stopped: cache dropped");
                break;
            };

            let started = Instant::now();
            let mut removed = 0;
            let mut passes = 0;
            {
                let mut guard = store.write().await;
                while !guard.is_empty() {
                    let expired = guard.sample_expired(config.samples);
                    removed += expired;
                    passes += 1;

                    if expired < threshold || started.elapsed() >= budget {
                        break;
                    }
                }
            }

            if removed > 0 {
                debug!("Expiry sweep: removed {} entries in {} passes", removed, passes);
            } else {
                trace!("Expiry sweep: no expired entries sampled");
            }
        }
    })
}
