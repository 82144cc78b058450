//! Cache Module
//!
//! Shared building blocks for every cache variant: the `MapCache` and
//! `SetCache` traits, namespace/expiry handling, and the in-memory store.

mod base;
mod entry;
mod stats;
mod store;


use async_trait::async_trait;

use crate::duration::Expiry;
use crate::error::Result;

// Re-export public types
pub use base::CacheBase;
pub use entry::{current_timestamp_ms, CacheEntry};
pub use stats::CacheStats;
pub use store::ExpiringStore;

// == Map Cache ==
/// Key/value cache with optional per-entry expiry.
///
/// Absence is `Ok(None)`; any value, including a `None` inside an `Option`
/// value type, can be cached.
#[async_trait]
pub trait MapCache<V: Send + 'static>: Send + Sync {
    /// Returns the live value for `key`.
    async fn get(&self, key: &str) -> Result<Option<V>>;

    /// Stores `value` under `key`.
    ///
    /// `ttl` of `None` uses the cache default; `Some(Expiry::Never)` stores
    /// without expiry.
    async fn set(&self, key: &str, value: V, ttl: Option<Expiry>) -> Result<bool>;

    async fn has(&self, key: &str) -> Result<bool>;

    /// Removes `key`, returning whether anything was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    async fn clear(&self) -> Result<()>;
}

// == Set Cache ==
/// Collection of unique values.
#[async_trait]
pub trait SetCache<V: Send + Sync + 'static>: Send + Sync {
    async fn add(&self, value: V) -> Result<bool>;

    async fn has(&self, value: &V) -> Result<bool>;

    /// Removes `value`, returning whether it was present.
    async fn delete(&self, value: &V) -> Result<bool>;

    async fn clear(&self) -> Result<()>;
}

// == Entries ==
/// Snapshot of `(key, value)` pairs taken when enumeration was requested.
///
/// Finite and consumed once; call `entries()` again for a fresh snapshot.
#[derive(Debug)]
pub struct Entries<V> {
    inner: std::vec::IntoIter<(String, V)>,
}

impl<V> Entries<V> {
    pub(crate) fn new(pairs: Vec<(String, V)>) -> Self {
        Self {
            inner: pairs.into_iter(),
        }
    }
}

impl<V> Iterator for Entries<V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Entries<V> {}
