//! Base Cache
//!
//! Namespace prefixing and default-expiry resolution shared by every variant.

use crate::duration::{parse_expiry, Expiry};
use crate::error::Result;

// == Cache Base ==
/// State common to all caches: an optional key namespace and a default TTL.
#[derive(Debug, Clone, Default)]
pub struct CacheBase {
    namespace: Option<String>,
    default_expiry: Option<u64>,
}

impl CacheBase {
    /// Creates a base, parsing the default expiry once.
    ///
    /// Fails with `InvalidDuration` if the default cannot be parsed.
    pub fn new(namespace: Option<String>, default_expiry: Option<&Expiry>) -> Result<Self> {
        Ok(Self {
            namespace,
            default_expiry: parse_expiry(default_expiry)?,
        })
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Default TTL in milliseconds.
    pub fn default_expiry(&self) -> Option<u64> {
        self.default_expiry
    }

    // == Resolve Expiry ==
    /// Resolves a per-call expiry against the default.
    ///
    /// `None` falls back to the default; `Some(Expiry::Never)` forces no expiry.
    pub fn resolve_expiry(&self, ttl: Option<&Expiry>) -> Result<Option<u64>> {
        match ttl {
            Some(expiry) => expiry.to_millis(),
            None => Ok(self.default_expiry),
        }
    }

    // == Prefixed Key ==
    /// Returns `"{namespace}:{key}"`, or `key` when there is no namespace.
    pub fn prefixed_key(&self, key: &str) -> String {
        match &self.namespace {
            Some(namespace) => format!("{}:{}", namespace, key),
            None => key.to_string(),
        }
    }
}
