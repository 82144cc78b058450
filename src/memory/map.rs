//! In-memory map cache.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::cache::{CacheBase, CacheEntry, CacheStats, ExpiringStore, MapCache};
use crate::config::MemoryCacheOptions;
use crate::duration::Expiry;
use crate::error::Result;
use crate::tasks::{current_runtime, spawn_sweep_task};

// == Memory Map Cache ==
/// Process-local key/value cache.
///
/// Expired entries are hidden from reads immediately and physically removed
/// either by the read that finds them or by the background sampling sweep.
/// The sweep stops when the cache is dropped or [`close`](Self::close)d.
#[derive(Debug)]
pub struct MemoryMapCache<V> {
    base: CacheBase,
    store: Arc<RwLock<ExpiringStore<V>>>,
    sweeper: JoinHandle<()>,
}

impl<V> MemoryMapCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache without default expiry.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Result<Self> {
        Self::with_options(MemoryCacheOptions::default())
    }

    pub fn with_options(options: MemoryCacheOptions) -> Result<Self> {
        current_runtime()?;
        let base = CacheBase::new(None, options.default_expiry.as_ref())?;
        let store = Arc::new(RwLock::new(ExpiringStore::new()));
        let sweeper = spawn_sweep_task(Arc::downgrade(&store), options.sweep);

        Ok(Self {
            base,
            store,
            sweeper,
        })
    }

    /// Physical entry count, including expired entries not yet swept.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    /// Keys of all live entries.
    pub async fn keys(&self) -> Vec<String> {
        self.store
            .read()
            .await
            .live_entries()
            .map(|(key, _)| key.to_string())
            .collect()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Stops the background sweep. Lazy expiry on reads keeps working.
    pub fn close(&self) {
        self.sweeper.abort();
    }
}

#[async_trait]
impl<V> MapCache<V> for MemoryMapCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>> {
        Ok(self.store.write().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: V, ttl: Option<Expiry>) -> Result<bool> {
        let expires_in = self.base.resolve_expiry(ttl.as_ref())?;
        let entry = CacheEntry::new(value, expires_in);
        self.store.write().await.insert(key.to_string(), entry);
        Ok(true)
    }

    async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.store.write().await.contains(key))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.store.write().await.remove(key))
    }

    async fn clear(&self) -> Result<()> {
        self.store.write().await.clear();
        Ok(())
    }
}

impl<V> Drop for MemoryMapCache<V> {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SweepConfig;
    use crate::error::CacheError;
    use std::time::Duration;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryMapCache::new().unwrap();

        assert!(cache.set("test", "epic".to_string(), None).await.unwrap());
        assert_eq!(cache.get("test").await.unwrap(), Some("epic".to_string()));
        assert!(cache.has("test").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache: MemoryMapCache<u32> = MemoryMapCache::new().unwrap();
        assert_eq!(cache.get("nope").await.unwrap(), None);
        assert!(!cache.has("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = MemoryMapCache::new().unwrap();
        cache.set("test", "epic", Some(Expiry::from("50ms"))).await.unwrap();

        assert_eq!(cache.get("test").await.unwrap(), Some("epic"));
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get("test").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_default_expiry_applies() {
        let options = MemoryCacheOptions::default().with_default_expiry(30u64);
        let cache = MemoryMapCache::with_options(options).unwrap();

        cache.set("a", 1, None).await.unwrap();
        cache.set("b", 2, Some(Expiry::Never)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(!cache.has("a").await.unwrap());
        assert_eq!(cache.get("b").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_null_values_are_cacheable() {
        let cache: MemoryMapCache<Option<u32>> = MemoryMapCache::new().unwrap();
        cache.set("empty", None, None).await.unwrap();

        assert!(cache.has("empty").await.unwrap());
        assert_eq!(cache.get("empty").await.unwrap(), Some(None));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_expiry() {
        let cache = MemoryMapCache::new().unwrap();
        cache.set("k", 1, Some(Expiry::Millis(20))).await.unwrap();
        cache.set("k", 2, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(cache.get("k").await.unwrap(), Some(2));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let cache = MemoryMapCache::new().unwrap();
        cache.set("a", 1, None).await.unwrap();
        cache.set("b", 2, None).await.unwrap();

        assert!(cache.delete("a").await.unwrap());
        assert!(!cache.delete("a").await.unwrap());
        assert_eq!(cache.get("a").await.unwrap(), None);

        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
        assert!(!cache.has("b").await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_skip_expired() {
        let cache = MemoryMapCache::new().unwrap();
        cache.set("short", 1, Some(Expiry::Millis(10))).await.unwrap();
        cache.set("long", 2, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.keys().await, vec!["long".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_ttl_is_rejected() {
        let cache = MemoryMapCache::new().unwrap();
        let result = cache.set("k", 1, Some(Expiry::from("eventually"))).await;
        assert!(matches!(result, Err(CacheError::InvalidDuration(_))));
        assert!(!cache.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_removes_without_reads() {
        let sweep = SweepConfig {
            interval: Duration::from_millis(20),
            ..SweepConfig::default()
        };
        let cache = MemoryMapCache::with_options(MemoryCacheOptions::default().with_sweep(sweep)).unwrap();
        for i in 0..100 {
            cache.set(&format!("k{}", i), i, Some(Expiry::Millis(5))).await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.stats().await.swept, 100);
    }

    #[tokio::test]
    async fn test_close_stops_sweep_but_not_lazy_expiry() {
        let sweep = SweepConfig {
            interval: Duration::from_millis(20),
            ..SweepConfig::default()
        };
        let cache = MemoryMapCache::with_options(MemoryCacheOptions::default().with_sweep(sweep)).unwrap();
        cache.close();

        cache.set("k", 1, Some(Expiry::Millis(5))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.len().await, 1, "closed cache should not sweep");
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert_eq!(cache.len().await, 0);
    }

    #[test]
    fn test_requires_runtime() {
        let result: Result<MemoryMapCache<u32>> = MemoryMapCache::new();
        assert!(matches!(result, Err(CacheError::Config(_))));
    }
}
