//! In-memory key-value store with automatic serialization and expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::CacheError;
use serde::{de::DeserializeOwned, Serialize};

/// A stored value and its optional deadline.
#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Type-safe cache held for the lifetime of one browsing session.
///
/// Values are stored as JSON so anything implementing `Serialize` and
/// `DeserializeOwned` round-trips without sharing references with the caller.
/// Nothing here outlives the process: dropping the cache drops every slot.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    entries: HashMap<String, Entry>,
    default_ttl: Option<Duration>,
}

impl Cache {
    /// Create an empty cache whose entries never expire unless asked to.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache applying `ttl` to every plain `set`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use shopfront_cache::Cache;
    ///
    /// let mut cache = Cache::with_default_ttl(Duration::from_secs(60));
    /// cache.set("greeting", &"hello").unwrap();
    /// assert!(cache.exists("greeting"));
    /// ```
    pub fn with_default_ttl(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl: Some(ttl),
        }
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => {
                let value: T = serde_json::from_slice(&entry.bytes)?;
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }

    /// Get a value, distinguishing a missing key from an expired one.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        match self.entries.get(key) {
            None => Err(CacheError::NotFound(key.to_string())),
            Some(entry) if entry.is_expired(Instant::now()) => {
                Err(CacheError::Expired(key.to_string()))
            }
            Some(entry) => Ok(serde_json::from_slice(&entry.bytes)?),
        }
    }

    /// Set a value using the cache's default time-to-live.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), CacheError> {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    /// Set a value with an explicit time-to-live (`None` keeps it until deleted).
    pub fn set_with_ttl<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .insert(key.to_string(), Entry { bytes, expires_at });
        Ok(())
    }

    /// Delete a value. Returns whether a live value was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => !entry.is_expired(Instant::now()),
            None => false,
        }
    }

    /// Check if a live key exists in the cache.
    pub fn exists(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(Instant::now()))
    }

    /// Get all live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Get all live keys under a prefix.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.keys()
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect()
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - self.entries.len();
        if purged > 0 {
            tracing::debug!(purged, "purged expired cache entries");
        }
        purged
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Whether the cache holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust
/// use shopfront_cache::cache_key;
///
/// let key = cache_key!("checkout", "ticket", "sess_abc");
/// assert_eq!(key, "checkout:ticket:sess_abc");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Slot {
        reference: String,
        amount: i64,
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = Cache::new();
        let slot = Slot {
            reference: "REF-1".to_string(),
            amount: 780,
        };
        cache.set("slot", &slot).unwrap();

        let loaded: Option<Slot> = cache.get("slot").unwrap();
        assert_eq!(loaded, Some(slot));
    }

    #[test]
    fn test_missing_key() {
        let cache = Cache::new();
        let loaded: Option<Slot> = cache.get("nope").unwrap();
        assert!(loaded.is_none());
        assert!(matches!(
            cache.require::<Slot>("nope"),
            Err(CacheError::NotFound(_))
        ));
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let mut cache = Cache::new();
        cache
            .set_with_ttl("short", &1u32, Some(Duration::ZERO))
            .unwrap();

        assert!(!cache.exists("short"));
        assert_eq!(cache.get::<u32>("short").unwrap(), None);
        assert!(matches!(
            cache.require::<u32>("short"),
            Err(CacheError::Expired(_))
        ));
        assert_eq!(cache.purge_expired(), 1);
    }

    #[test]
    fn test_default_ttl_applies() {
        let mut cache = Cache::with_default_ttl(Duration::ZERO);
        cache.set("a", &1u32).unwrap();
        cache.set_with_ttl("b", &2u32, None).unwrap();
        assert_eq!(cache.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn test_delete() {
        let mut cache = Cache::new();
        cache.set("a", &1u32).unwrap();
        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keys_with_prefix() {
        let mut cache = Cache::new();
        cache.set(&cache_key!("processed", "REF-1"), &true).unwrap();
        cache.set(&cache_key!("processed", "REF-2"), &true).unwrap();
        cache.set(&cache_key!("ticket", "sess"), &true).unwrap();

        assert_eq!(cache.keys_with_prefix("processed:").len(), 2);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_type_mismatch_is_serialize_error() {
        let mut cache = Cache::new();
        cache.set("n", &"not a number").unwrap();
        assert!(matches!(
            cache.get::<u32>("n"),
            Err(CacheError::SerializeError(_))
        ));
    }
}
