//! SQLite-backed map cache.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::{self, JoinHandle};

use super::store::{DiskStore, DiskTarget};
use crate::cache::{Entries, MapCache};
use crate::config::DiskCacheOptions;
use crate::duration::Expiry;
use crate::error::{CacheError, Result};
use crate::tasks::{current_runtime, spawn_age_sweep_task};

// == Disk Map Cache ==
/// Key/value cache persisted in a single SQLite table.
///
/// Values are bincode encoded. There is no per-entry TTL: with `max_age`
/// set, a background sweep deletes rows not written for that long, and
/// with `max_items` set, inserting past the cap evicts the oldest row.
pub struct DiskMapCache<V> {
    store: Arc<Mutex<DiskStore>>,
    sweeper: Option<JoinHandle<()>>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> DiskMapCache<V> {
    /// Opens the cache table at `target`.
    ///
    /// With `max_age` configured this must be called inside a Tokio runtime.
    pub fn open(target: impl Into<DiskTarget>, options: DiskCacheOptions) -> Result<Self> {
        let max_age = match &options.max_age {
            Some(expiry) => match expiry.to_millis()? {
                Some(ms) if ms > 0 => Some(ms),
                _ => {
                    return Err(CacheError::Config(
                        "max_age must be a positive duration".to_string(),
                    ))
                }
            },
            None => None,
        };
        if max_age.is_some() {
            current_runtime()?;
        }

        let store = Arc::new(Mutex::new(DiskStore::open(target.into(), &options)?));
        let sweeper = max_age.map(|ms| spawn_age_sweep_task(Arc::downgrade(&store), ms));

        Ok(Self {
            store,
            sweeper,
            _marker: PhantomData,
        })
    }

    pub fn open_in_memory(options: DiskCacheOptions) -> Result<Self> {
        Self::open(DiskTarget::Memory, options)
    }

    /// Runs `f` against the store on the blocking pool.
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut DiskStore) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        task::spawn_blocking(move || {
            let mut guard = store.lock();
            f(&mut *guard)
        })
        .await?
    }

    /// Number of rows, possibly served from the short-lived count cache.
    pub async fn count(&self) -> Result<u64> {
        self.run(|store| store.count()).await
    }

    /// Keys, oldest first.
    pub async fn keys(&self) -> Result<Vec<String>> {
        self.run(|store| store.keys()).await
    }

    /// Stops the age sweep, if any.
    pub fn close(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.abort();
        }
    }
}

impl<V> DiskMapCache<V>
where
    V: DeserializeOwned,
{
    pub async fn values(&self) -> Result<Vec<V>> {
        Ok(self.entries().await?.map(|(_, value)| value).collect())
    }

    /// Snapshot of every row, oldest first.
    pub async fn entries(&self) -> Result<Entries<V>> {
        let rows = self.run(|store| store.rows()).await?;
        let mut pairs = Vec::with_capacity(rows.len());
        for (key, raw) in rows {
            pairs.push((key, bincode::deserialize(&raw)?));
        }
        Ok(Entries::new(pairs))
    }
}

#[async_trait]
impl<V> MapCache<V> for DiskMapCache<V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>> {
        let key = key.to_string();
        match self.run(move |store| store.get(&key)).await? {
            Some(raw) => Ok(Some(bincode::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Only `None` or `Some(Expiry::Never)` are accepted as `ttl`; row
    /// lifetime is governed by `max_age`.
    async fn set(&self, key: &str, value: V, ttl: Option<Expiry>) -> Result<bool> {
        if !matches!(ttl, None | Some(Expiry::Never)) {
            return Err(CacheError::Unsupported(
                "per-entry expiry on a disk cache; configure max_age instead".to_string(),
            ));
        }

        let key = key.to_string();
        let raw = bincode::serialize(&value)?;
        self.run(move |store| store.set(&key, &raw)).await?;
        Ok(true)
    }

    async fn has(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.run(move |store| store.has(&key)).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.run(move |store| store.delete(&key)).await
    }

    async fn clear(&self) -> Result<()> {
        self.run(|store| store.clear()).await
    }
}

impl<V> fmt::Debug for DiskMapCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskMapCache")
            .field("age_sweep", &self.sweeper.is_some())
            .finish_non_exhaustive()
    }
}

impl<V> Drop for DiskMapCache<V> {
    fn drop(&mut self) {
        self.close();
    }
}
