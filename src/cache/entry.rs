//! Cache Entry Module
//!
//! Defines the structure for individual in-memory entries with TTL support.

use chrono::Utc;

// == Cache Entry ==
/// A single in-memory value with its absolute expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl_ms` from now.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_ms` - Optional TTL in milliseconds
    pub fn new(value: V, ttl_ms: Option<u64>) -> Self {
        let expires_at = ttl_ms.map(|ttl| current_timestamp_ms().saturating_add(ttl));
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`is_expired`](Self::is_expired) against a fixed clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
