//! kas_cache - Map and set caches with TTL expiration
//!
//! Interchangeable caches over three storage strategies:
//! - [`memory`]: process-local, lazy expiry plus a random-sampling sweep
//! - [`redis`]: Redis with native per-key TTL and optional key tracking
//! - [`disk`]: SQLite with an age sweep and a row cap
//!
//! All map caches implement [`MapCache`], all set caches [`SetCache`].

pub mod cache;
pub mod config;
pub mod disk;
pub mod duration;
pub mod error;
pub mod memory;
pub mod redis;
pub mod tasks;

pub use crate::cache::{Entries, MapCache, SetCache};
pub use crate::config::{DiskCacheOptions, MemoryCacheOptions, RedisCacheOptions, SweepConfig};
pub use crate::disk::DiskMapCache;
pub use crate::duration::Expiry;
pub use crate::error::{CacheError, Result};
pub use crate::memory::{MemoryMapCache, MemorySetCache};
pub use crate::redis::{RedisMapCache, RedisSetCache, SetMode};
