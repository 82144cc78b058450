//! In-process stand-in for Redis used by unit tests.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::{ErrorKind, RedisError};

use super::backend::{RedisBackend, SetCommand, SetMode};
use crate::error::Result;

#[derive(Debug, Default)]
struct State {
    strings: HashMap<String, (String, Option<Instant>)>,
    sets: HashMap<String, HashSet<String>>,
    round_trips: usize,
}

impl State {
    fn live(&mut self, key: &str) -> Option<&(String, Option<Instant>)> {
        let expired = matches!(self.strings.get(key), Some((_, Some(at))) if Instant::now() >= *at);
        if expired {
            self.strings.remove(key);
        }
        self.strings.get(key)
    }

    fn apply_set(&mut self, command: SetCommand) -> Result<bool> {
        if command.mode == Some(SetMode::KeepTtl) && command.expiry_ms.is_some() {
            return Err(RedisError::from((ErrorKind::ResponseError, "syntax error")).into());
        }

        let existing = self.live(&command.key).cloned();
        let expiry = match (command.mode, command.expiry_ms) {
            (Some(SetMode::KeepTtl), _) => existing.as_ref().and_then(|(_, at)| *at),
            (_, Some(ms)) => Some(Instant::now() + Duration::from_millis(ms)),
            (_, None) => None,
        };

        match command.mode {
            Some(SetMode::OnlyIfUnset) if existing.is_some() => return Ok(false),
            Some(SetMode::OnlyIfSet) if existing.is_none() => return Ok(false),
            _ => {}
        }

        self.strings.insert(command.key, (command.value, expiry));
        Ok(true)
    }

    fn delete(&mut self, key: &str) -> u64 {
        let string = self.live(key).is_some();
        self.strings.remove(key);
        let set = self.sets.remove(key).is_some();
        u64::from(string || set)
    }
}

/// Emulates the subset of Redis the caches use, including `PX` expiry and
/// the syntax error Redis raises for `PX` combined with `KEEPTTL`.
#[derive(Debug, Default)]
pub struct FakeRedis {
    state: Mutex<State>,
}

impl FakeRedis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of network round trips a real server would have seen.
    pub fn round_trips(&self) -> usize {
        self.state.lock().round_trips
    }

    /// Raw string stored under a fully prefixed key.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.state.lock().live(key).map(|(value, _)| value.clone())
    }

    /// Drops a key behind the cache's back, as an expiry would.
    pub fn expire_now(&self, key: &str) {
        self.state.lock().strings.remove(key);
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock();
        state.round_trips += 1;
        f(&mut state)
    }
}

#[async_trait]
impl RedisBackend for FakeRedis {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.with_state(|s| s.live(key).map(|(value, _)| value.clone())))
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        Ok(self.with_state(|s| {
            keys.iter()
                .map(|key| s.live(key).map(|(value, _)| value.clone()))
                .collect()
        }))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.with_state(|s| s.live(key).is_some() || s.sets.contains_key(key)))
    }

    async fn set(&self, command: SetCommand) -> Result<bool> {
        self.with_state(|s| s.apply_set(command))
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        Ok(self.with_state(|s| keys.iter().map(|key| s.delete(key)).sum()))
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self.with_state(|s| {
            s.sets
                .entry(key.to_string())
                .or_default()
                .insert(member.to_string())
        }))
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self.with_state(|s| {
            let removed = s.sets.get_mut(key).map(|set| set.remove(member)).unwrap_or(false);
            if s.sets.get(key).map(HashSet::is_empty).unwrap_or(false) {
                s.sets.remove(key);
            }
            removed
        }))
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self.with_state(|s| s.sets.get(key).map(|set| set.contains(member)).unwrap_or(false)))
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.with_state(|s| {
            let mut members: Vec<String> = s.sets.get(key).into_iter().flatten().cloned().collect();
            members.sort();
            members
        }))
    }

    async fn tracked_set(&self, tracking_key: &str, member: &str, command: SetCommand) -> Result<bool> {
        self.with_state(|s| {
            s.sets
                .entry(tracking_key.to_string())
                .or_default()
                .insert(member.to_string());
            s.apply_set(command)
        })
    }

    async fn tracked_del(&self, tracking_key: &str, member: &str, key: &str) -> Result<u64> {
        Ok(self.with_state(|s| {
            if let Some(set) = s.sets.get_mut(tracking_key) {
                set.remove(member);
            }
            s.delete(key)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    #[tokio::test]
    async fn test_px_with_keepttl_is_a_syntax_error() {
        let redis = FakeRedis::new();
        let command = SetCommand {
            key: "ns:k".to_string(),
            value: "1".to_string(),
            expiry_ms: Some(30),
            mode: Some(SetMode::KeepTtl),
        };

        assert!(matches!(redis.set(command).await, Err(CacheError::Redis(_))));
        assert_eq!(redis.raw("ns:k"), None);
    }
}
