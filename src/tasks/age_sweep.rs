//! Age Sweep Task
//!
//! Background task that deletes SQLite rows not written within `max_age`.

use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::cache::current_timestamp_ms;
use crate::disk::DiskStore;

/// Spawns the age sweep for one disk cache.
///
/// Every `max_age_ms` the task deletes rows whose `updated_at` is older than
/// `now - max_age_ms`. Failures are logged and retried on the next tick.
pub(crate) fn spawn_age_sweep_task(store: Weak<Mutex<DiskStore>>, max_age_ms: u64) -> JoinHandle<()> {
    let interval = Duration::from_millis(max_age_ms);

    tokio::spawn(async move {
        info!("Starting age sweep with max age of {}ms", max_age_ms);

        loop {
            tokio::time::sleep(interval).await;

            let Some(store) = store.upgrade() else {
                debug!("Age sweep stopped: cache dropped");
                break;
            };

            let cutoff = current_timestamp_ms().saturating_sub(max_age_ms);
            let result = task::spawn_blocking(move || {
                let mut guard = store.lock();
                guard.purge_older_than(cutoff)
            })
            .await;

            match result {
                Ok(Ok(0)) => {}
                Ok(Ok(removed)) => info!("Age sweep: removed {} stale rows", removed),
                Ok(Err(err)) => warn!("Age sweep failed: {}", err),
                Err(err) => warn!("Age sweep task failed: {}", err),
            }
        }
    })
}
