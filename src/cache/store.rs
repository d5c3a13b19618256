//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheMetrics, LruTracker, MetricsRecorder};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;

// == TTL Cache ==
/// Bounded cache with LRU eviction and a uniform TTL.
///
/// Expiry is lazy: an expired entry stays physically present (and is counted
/// by [`len`](Self::len) and [`keys`](Self::keys)) until a `get` on it, a
/// [`purge_expired`](Self::purge_expired) sweep, or eviction removes it.
#[derive(Debug)]
pub struct TtlCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Recency order, least recently used first
    lru: LruTracker,
    /// Lifetime counters, shared with fetchers working for this cache
    metrics: Arc<MetricsRecorder>,
    clock: Arc<dyn Clock>,
    capacity: usize,
    ttl_ms: u64,
}

impl<V> TtlCache<V> {
    // == Constructor ==
    /// Creates a cache on the system clock.
    ///
    /// # Errors
    /// `ConfigurationError` if `capacity` or `ttl_ms` is zero.
    pub fn new(capacity: usize, ttl_ms: u64) -> Result<Self> {
        Self::from_config(&CacheConfig::new(capacity, ttl_ms))
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            entries: HashMap::with_capacity(config.capacity),
            lru: LruTracker::new(),
            metrics: Arc::new(MetricsRecorder::new()),
            clock,
            capacity: config.capacity,
            ttl_ms: config.ttl_ms,
        })
    }

    // == Set ==
    /// Stores a value, overwriting any previous value for `key`.
    ///
    /// Overwriting restarts the TTL window and marks the key most recently
    /// used, but keeps its `use_count`. Inserting a new key into a full cache
    /// first evicts the least recently used entry, so the capacity bound holds
    /// when this returns.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = self.clock.now_ms();

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.replace(value, now);
            self.lru.touch(&key);
            return;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.lru.evict_oldest().map(|victim| {
                self.entries.remove(&victim);
                victim
            })
        } else {
            None
        };

        self.entries.insert(key.clone(), CacheEntry::new(value, now));
        self.lru.touch(&key);

        if let Some(victim) = evicted {
            self.metrics.record_eviction();
            debug!(evicted = %victim, inserted = %key, "Evicted least recently used entry");
        }
    }

    // == Get ==
    /// Returns a clone of the live value for `key`.
    ///
    /// A hit bumps the entry's `use_count`, access time and recency. An entry
    /// found expired is removed on the spot. Both absent and expired keys
    /// count as one miss.
    pub fn get(&mut self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let now = self.clock.now_ms();
        let ttl_ms = self.ttl_ms;

        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now, ttl_ms) => {
                entry.touch(now);
                let value = entry.value.clone();
                self.lru.touch(key);
                self.metrics.record_hit();
                return Some(value);
            }
            Some(_) => {}
            None => {
                self.metrics.record_miss();
                return None;
            }
        }

        // Present but expired
        self.remove(key);
        self.metrics.record_expiration();
        self.metrics.record_miss();
        debug!(key = %key, "Lazily expired entry on read");
        None
    }

    // == Peek ==
    /// Returns the live value without touching metrics, recency or use count.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.live_entry(key).map(|entry| &entry.value)
    }

    /// Returns whether `key` holds a live value, without side effects.
    pub fn contains_live(&self, key: &str) -> bool {
        self.live_entry(key).is_some()
    }

    /// Raw entry access for inspection, expired or not.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.live_entry(key)
            .map(|entry| Duration::from_millis(entry.ttl_remaining_ms(now, self.ttl_ms)))
    }

    // == Delete ==
    /// Removes `key` if present. Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove(key)
    }

    // == Clear ==
    /// Removes every entry. Lifetime counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    /// Zeroes the lifetime counters.
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let ttl_ms = self.ttl_ms;
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, ttl_ms))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove(key);
            self.metrics.record_expiration();
        }

        expired_keys.len()
    }

    // == Length ==
    /// Number of physically present entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Present keys, least recently used first.
    pub fn keys(&self) -> Vec<String> {
        self.lru.iter().map(str::to_string).collect()
    }

    // == Frequent Ratio ==
    /// Fraction of present entries whose `use_count` exceeds `threshold`.
    ///
    /// Computed on demand; returns 0.0 for an empty cache.
    pub fn frequent_ratio(&self, threshold: u64) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let frequent = self
            .entries
            .values()
            .filter(|entry| entry.use_count > threshold)
            .count();
        frequent as f64 / self.entries.len() as f64
    }

    // == Metrics ==
    /// Returns a snapshot of counters and current contents.
    pub fn metrics(&self) -> CacheMetrics {
        self.metrics
            .snapshot(self.len(), self.capacity, self.keys(), self.clock.now_ms())
    }

    /// Shared handle to the counters, for recording fetch outcomes.
    pub fn recorder(&self) -> Arc<MetricsRecorder> {
        Arc::clone(&self.metrics)
    }

    fn live_entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now, self.ttl_ms))
    }

    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            true
        } else {
            false
        }
    }
}
