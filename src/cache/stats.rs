//! Cache Statistics Module
//!
//! Tracks read outcomes and expirations for the in-memory caches.

use serde::Serialize;

// == Cache Stats ==
/// Counters for one in-memory store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads that found a live entry
    pub hits: u64,
    /// Reads that found nothing or an expired entry
    pub misses: u64,
    /// Entries removed lazily by a read that found them expired
    pub lazy_expirations: u64,
    /// Entries removed by the background sweep
    pub swept: u64,
    /// Current physical number of entries, expired or not
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries removed for having expired, by reads and sweeps combined.
    pub fn expirations(&self) -> u64 {
        self.lazy_expirations + self.swept
    }

    // == Hit Rate ==
    /// hits / (hits + misses), or 0.0 before the first read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_lazy_expiration(&mut self) {
        self.lazy_expirations += 1;
    }

    pub fn record_swept(&mut self, count: usize) {
        self.swept += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.lazy_expirations, 0);
        assert_eq!(stats.swept, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_record_expirations() {
        let mut stats = CacheStats::new();
        stats.record_lazy_expiration();
        stats.record_swept(3);
        stats.record_swept(2);
        assert_eq!(stats.lazy_expirations, 1);
        assert_eq!(stats.swept, 5);
        assert_eq!(stats.expirations(), 6);
    }
}
