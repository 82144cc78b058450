//! Configuration Module
//!
//! Construction options for each cache variant, plus sweep tuning that can
//! be loaded from environment variables.

use std::env;
use std::time::Duration;

use crate::duration::Expiry;

/// Default table used by the SQLite-backed cache.
pub const DEFAULT_TABLE_NAME: &str = "kas_cache";

/// How long a cached row count stays trusted before it is re-read.
pub const COUNT_CACHE_WINDOW: Duration = Duration::from_secs(5);

// == Sweep Config ==
/// Tuning for the random-sampling expiry sweep of in-memory caches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    /// Delay between sweep ticks
    pub interval: Duration,
    /// Number of random entries inspected per pass
    pub samples: usize,
    /// Expired share of a pass (percent) that triggers another pass
    pub recheck_percent: u8,
}

impl SweepConfig {
    /// Creates a new SweepConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `KAS_SWEEP_INTERVAL_MS` - Delay between sweep ticks (default: 100)
    /// - `KAS_SWEEP_SAMPLES` - Entries sampled per pass (default: 20)
    /// - `KAS_SWEEP_RECHECK_PERCENT` - Re-check threshold (default: 80)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval: env::var("KAS_SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            samples: env::var("KAS_SWEEP_SAMPLES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.samples),
            recheck_percent: env::var("KAS_SWEEP_RECHECK_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|p: &u8| *p <= 100)
                .unwrap_or(defaults.recheck_percent),
        }
    }

    /// Number of expired samples in one pass that triggers another pass.
    pub fn recheck_threshold(&self) -> usize {
        // Never zero, otherwise every pass would re-trigger.
        (((self.samples * self.recheck_percent as usize) + 99) / 100).max(1)
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            samples: 20,
            recheck_percent: 80,
        }
    }
}

// == Memory Cache Options ==
/// Options for [`MemoryMapCache`](crate::memory::MemoryMapCache) and
/// [`MemorySetCache`](crate::memory::MemorySetCache).
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheOptions {
    /// Expiry applied when `set`/`add` is called without one
    pub default_expiry: Option<Expiry>,
    /// Background sweep tuning
    pub sweep: SweepConfig,
}

impl MemoryCacheOptions {
    pub fn with_default_expiry(mut self, expiry: impl Into<Expiry>) -> Self {
        self.default_expiry = Some(expiry.into());
        self
    }

    pub fn with_sweep(mut self, sweep: SweepConfig) -> Self {
        self.sweep = sweep;
        self
    }
}

// == Redis Cache Options ==
/// Options for the Redis-backed caches.
#[derive(Debug, Clone, Default)]
pub struct RedisCacheOptions {
    /// Expiry applied when `set` is called without one
    pub default_expiry: Option<Expiry>,
    /// Keep a membership set of written keys.
    ///
    /// Required for `keys`, `values`, `entries` and `clear`. Costs an extra
    /// command per write, so enable it only on small caches. Keys written
    /// before tracking was enabled, or by untracked caches sharing the
    /// namespace, are invisible to it.
    pub track_keys: bool,
}

impl RedisCacheOptions {
    pub fn with_default_expiry(mut self, expiry: impl Into<Expiry>) -> Self {
        self.default_expiry = Some(expiry.into());
        self
    }

    pub fn with_track_keys(mut self, track_keys: bool) -> Self {
        self.track_keys = track_keys;
        self
    }
}

impl From<Expiry> for RedisCacheOptions {
    fn from(expiry: Expiry) -> Self {
        Self::default().with_default_expiry(expiry)
    }
}

// == Disk Cache Options ==
/// Options for [`DiskMapCache`](crate::disk::DiskMapCache).
#[derive(Debug, Clone)]
pub struct DiskCacheOptions {
    /// Table holding this cache's rows
    pub table_name: String,
    /// Row cap; the oldest row is evicted when an insert exceeds it
    pub max_items: Option<u64>,
    /// Rows not written for this long are purged by a periodic sweep
    pub max_age: Option<Expiry>,
    /// Always run `COUNT(*)` instead of caching the row count
    pub disable_count_cache: bool,
}

impl DiskCacheOptions {
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_max_items(mut self, max_items: u64) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn with_max_age(mut self, max_age: impl Into<Expiry>) -> Self {
        self.max_age = Some(max_age.into());
        self
    }

    pub fn with_count_cache_disabled(mut self) -> Self {
        self.disable_count_cache = true;
        self
    }
}

impl Default for DiskCacheOptions {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            max_items: None,
            max_age: None,
            disable_count_cache: false,
        }
    }
}
