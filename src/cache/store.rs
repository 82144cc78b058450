//! Cache Store Module
//!
//! In-memory storage with lazy TTL expiration and O(1) random sampling for
//! the background sweep.

use std::collections::HashMap;

use rand::Rng;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats};

// == Expiring Store ==
/// Key/value storage whose entries can be sampled uniformly at random.
///
/// Entries live in a dense `Vec` so a random index is a random entry; the
/// `HashMap` maps each key to its slot. Removal swaps the last slot into the
/// hole, keeping both structures dense.
#[derive(Debug)]
pub struct ExpiringStore<V> {
    slots: Vec<(String, CacheEntry<V>)>,
    index: HashMap<String, usize>,
    stats: CacheStats,
}

impl<V> Default for ExpiringStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ExpiringStore<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            stats: CacheStats::new(),
        }
    }

    // == Insert ==
    /// Stores an entry, replacing any previous value and expiry for `key`.
    pub fn insert(&mut self, key: String, entry: CacheEntry<V>) {
        match self.index.get(&key) {
            Some(&slot) => self.slots[slot].1 = entry,
            None => {
                self.index.insert(key.clone(), self.slots.len());
                self.slots.push((key, entry));
            }
        }
    }

    // == Get ==
    /// Returns the live value for `key`.
    ///
    /// An expired entry is removed on the spot and reported as missing.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        if !self.evict_if_expired(key) {
            self.stats.record_miss();
            return None;
        }

        let slot = self.index[key];
        self.stats.record_hit();
        Some(&self.slots[slot].1.value)
    }

    // == Contains ==
    /// Existence check with the same lazy expiry as [`get`](Self::get).
    pub fn contains(&mut self, key: &str) -> bool {
        self.evict_if_expired(key)
    }

    // == Remove ==
    /// Removes `key`, returning whether it was physically present.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.index.get(key) {
            Some(&slot) => {
                self.remove_slot(slot);
                true
            }
            None => false,
        }
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }

    /// Physical entry count, including entries not yet swept.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Keys and values of entries that have not expired.
    pub fn live_entries(&self) -> impl Iterator<Item = (&str, &V)> {
        let now = current_timestamp_ms();
        self.slots
            .iter()
            .filter(move |(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| (key.as_str(), &entry.value))
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.slots.len());
        stats
    }

    // == Sample Expired ==
    /// Runs one sweep pass over `samples` randomly chosen entries.
    ///
    /// Every sampled entry whose expiry has passed is removed. Returns the
    /// number of entries removed by this pass.
    pub fn sample_expired(&mut self, samples: usize) -> usize {
        let now = current_timestamp_ms();
        let mut rng = rand::thread_rng();
        let mut expired = 0;

        for _ in 0..samples {
            if self.slots.is_empty() {
                break;
            }

            let slot = rng.gen_range(0..self.slots.len());
            if self.slots[slot].1.is_expired_at(now) {
                self.remove_slot(slot);
                expired += 1;
            }
        }

        self.stats.record_swept(expired);
        expired
    }

    /// Returns true if `key` is present and live, removing it if expired.
    fn evict_if_expired(&mut self, key: &str) -> bool {
        let Some(&slot) = self.index.get(key) else {
            return false;
        };

        if self.slots[slot].1.is_expired() {
            self.remove_slot(slot);
            self.stats.record_lazy_expiration();
            return false;
        }

        true
    }

    fn remove_slot(&mut self, slot: usize) {
        let (key, _) = self.slots.swap_remove(slot);
        self.index.remove(&key);
        if let Some((moved_key, _)) = self.slots.get(slot) {
            self.index.insert(moved_key.clone(), slot);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn entry(value: &str, ttl_ms: Option<u64>) -> CacheEntry<String> {
        CacheEntry::new(value.to_string(), ttl_ms)
    }

    #[test]
    fn test_store_insert_and_get() {
        let mut store = ExpiringStore::new();
        store.insert("key1".to_string(), entry("value1", None));

        assert_eq!(store.get("key1").map(String::as_str), Some("value1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_overwrite_keeps_single_slot() {
        let mut store = ExpiringStore::new();
        store.insert("key1".to_string(), entry("value1", None));
        store.insert("key1".to_string(), entry("value2", None));

        assert_eq!(store.get("key1").map(String::as_str), Some("value2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_remove_reindexes_moved_slot() {
        let mut store = ExpiringStore::new();
        for key in ["a", "b", "c"] {
            store.insert(key.to_string(), entry(key, None));
        }

        assert!(store.remove("a"));
        assert!(!store.remove("a"));

        // "c" was swapped into slot 0 and must still resolve
        assert_eq!(store.get("c").map(String::as_str), Some("c"));
        assert_eq!(store.get("b").map(String::as_str), Some("b"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_lazy_expiration() {
        let mut store = ExpiringStore::new();
        store.insert("key1".to_string(), entry("value1", Some(20)));

        assert!(store.contains("key1"));
        sleep(Duration::from_millis(40));

        // Physically present until read
        assert_eq!(store.len(), 1);
        assert!(store.get("key1").is_none());
        assert_eq!(store.len(), 0);

        let stats = store.stats();
        assert_eq!(stats.lazy_expirations, 1);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_sample_expired_only_removes_expired() {
        let mut store = ExpiringStore::new();
        store.insert("short".to_string(), entry("v", Some(10)));
        store.insert("long".to_string(), entry("v", Some(60_000)));
        store.insert("forever".to_string(), entry("v", None));

        sleep(Duration::from_millis(30));

        let mut removed = 0;
        for _ in 0..50 {
            removed += store.sample_expired(20);
        }

        assert_eq!(removed, 1);
        assert_eq!(store.len(), 2);
        assert!(store.contains("long"));
        assert!(store.contains("forever"));
        assert_eq!(store.stats().swept, 1);
    }

    #[test]
    fn test_sample_expired_on_empty_store() {
        let mut store: ExpiringStore<String> = ExpiringStore::new();
        assert_eq!(store.sample_expired(20), 0);
    }

    #[test]
    fn test_live_entries_skip_expired() {
        let mut store = ExpiringStore::new();
        store.insert("dead".to_string(), entry("x", Some(5)));
        store.insert("alive".to_string(), entry("y", None));
        sleep(Duration::from_millis(20));

        let live: Vec<_> = store.live_entries().map(|(k, _)| k.to_string()).collect();
        assert_eq!(live, vec!["alive".to_string()]);
    }
}
