//! In-memory TTL memoization backed by `DashMap`.
//!
//! Optional short-TTL memoization of whole-universe query results, so
//! a dashboard page rendering thirty widgets does not issue thirty
//! identical grid POSTs. Values are stored as serialized JSON;
//! expired entries are lazily evicted on the next lookup. The
//! acquisition layer itself stays cache-free.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::TefasError;

struct CacheEntry {
    json: String,
    expires_at: Instant,
}

/// Thread-safe in-memory cache with time-to-live expiration.
pub struct MemoryCache {
    store: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// Returns the deserialized records for `key`, or `None` when the
    /// key is missing or expired. A cached string that no longer
    /// deserializes is a [`TefasError::Cache`] — it means the stored
    /// shape and the record type drifted apart.
    pub fn get_records<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, TefasError> {
        let Some(entry) = self.store.get(key) else {
            return Ok(None);
        };
        if Instant::now() > entry.expires_at {
            drop(entry);
            self.store.remove(key);
            return Ok(None);
        }
        serde_json::from_str(&entry.json)
            .map(Some)
            .map_err(|e| TefasError::Cache(format!("stale cached shape for {key:?}: {e}")))
    }

    /// Serializes and stores `records` under `key` with the configured
    /// TTL, overwriting any previous entry.
    pub fn set_records<T: Serialize>(&self, key: &str, records: &T) -> Result<(), TefasError> {
        let json = serde_json::to_string(records)?;
        self.store.insert(
            key.to_string(),
            CacheEntry {
                json,
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(())
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trips_records() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.set_records("funds", &vec!["MAC".to_string()]).unwrap();
        let cached: Option<Vec<String>> = cache.get_records("funds").unwrap();
        assert_eq!(cached, Some(vec!["MAC".to_string()]));
    }

    #[test]
    fn missing_key_is_none_not_error() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let cached: Option<Vec<String>> = cache.get_records("nope").unwrap();
        assert_eq!(cached, None);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = MemoryCache::new(Duration::from_millis(1));
        cache.set_records("funds", &vec![1, 2, 3]).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        let cached: Option<Vec<i32>> = cache.get_records("funds").unwrap();
        assert_eq!(cached, None);
    }

    #[test]
    fn mismatched_shape_is_a_cache_error() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.set_records("funds", &vec!["text".to_string()]).unwrap();
        let cached: Result<Option<Vec<i64>>, _> = cache.get_records("funds");
        assert!(matches!(cached, Err(TefasError::Cache(_))));
    }

    #[test]
    fn overwrite_replaces_the_value() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.set_records("k", &1).unwrap();
        cache.set_records("k", &2).unwrap();
        let cached: Option<i32> = cache.get_records("k").unwrap();
        assert_eq!(cached, Some(2));
    }
}
