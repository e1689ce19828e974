//! # Result Cache
//! Memoizes expensive calls (headline fetch, LLM analysis) keyed by the full
//! argument signature, with optional time-to-live.
//!
//! Absolute TTL, no sliding refresh: a lookup after expiry behaves as a miss
//! and triggers recomputation. Failed computations propagate to the caller
//! and are never stored, so a failed fetch is retried on the next call
//! instead of being memoized as empty.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use metrics::counter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Key for one memoized call: function identity plus argument signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Start a key for the given function identity; chain `.arg(..)` for each
    /// argument, then `.finish()`.
    pub fn of(func: &str) -> CacheKeyBuilder {
        let mut hasher = Sha256::new();
        hasher.update(func.as_bytes());
        hasher.update([0]);
        CacheKeyBuilder { hasher }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub struct CacheKeyBuilder {
    hasher: Sha256,
}

impl CacheKeyBuilder {
    pub fn arg(mut self, a: impl AsRef<[u8]>) -> Self {
        self.hasher.update(a.as_ref());
        // separator so ("ab","c") and ("a","bc") hash differently
        self.hasher.update([0]);
        self
    }

    pub fn finish(self) -> CacheKey {
        CacheKey(format!("{:x}", self.hasher.finalize()))
    }
}

#[derive(Debug)]
struct Entry {
    value: serde_json::Value,
    inserted_at: Instant,
    ttl: Option<Duration>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        match self.ttl {
            Some(ttl) => self.inserted_at.elapsed() > ttl,
            None => false,
        }
    }
}

/// In-memory key/value store with pluggable TTL. One mutex around the map is
/// enough under the single-flow model; concurrent calls with the same key may
/// duplicate a computation, which is wasteful but not incorrect.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// On a hit within ttl, returns the stored value without invoking
    /// `compute`. On miss or expiry, invokes `compute` exactly once, stores
    /// the result on success and returns it. Errors propagate uncached.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: CacheKey,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.lookup::<T>(&key) {
            counter!("cache_hits_total").increment(1);
            return Ok(hit);
        }
        counter!("cache_misses_total").increment(1);

        let fresh = compute().await?;
        self.store(&key, &fresh, ttl);
        Ok(fresh)
    }

    /// Drop every entry (e.g. a user-triggered refresh).
    pub fn clear(&self) {
        self.entries.lock().expect("cache mutex poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key.as_str()) {
            Some(e) if !e.is_expired() => {
                // A stored value that no longer deserializes counts as a miss.
                serde_json::from_value(e.value.clone()).ok()
            }
            Some(_) => {
                entries.remove(key.as_str());
                None
            }
            None => None,
        }
    }

    fn store<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Option<Duration>) {
        let json = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "cache store skipped: value not serializable");
                return;
            }
        };
        self.entries.lock().expect("cache mutex poisoned").insert(
            key.as_str().to_string(),
            Entry {
                value: json,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }
}
