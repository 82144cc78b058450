//! Background Tasks Module
//!
//! Per-cache background tasks. Each task is owned by one cache instance,
//! holds only a weak reference to its state, and ends with it.
//!
//! # Tasks
//! - Expiry sweep: samples in-memory entries and removes expired ones
//! - Age sweep: deletes SQLite rows older than the configured max age

mod age_sweep;
mod sweep;

pub(crate) use age_sweep::spawn_age_sweep_task;
pub use sweep::spawn_sweep_task;

use tokio::runtime::Handle;

use crate::error::{CacheError, Result};

/// Returns the current Tokio runtime, required to spawn background tasks.
pub(crate) fn current_runtime() -> Result<Handle> {
    Handle::try_current().map_err(|_| {
        CacheError::Config("caches with background sweeps must be created inside a Tokio runtime".to_string())
    })
}
