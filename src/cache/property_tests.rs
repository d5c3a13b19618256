//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against a straightforward reference model.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{generate_cache_key, RequestFingerprint, TtlCache};
use crate::clock::ManualClock;
use crate::config::CacheConfig;

// == Test Configuration ==
const TEST_CAPACITY: usize = 100;
const TEST_TTL_MS: u64 = 1_000;

fn cache_with_clock(capacity: usize, ttl_ms: u64) -> (TtlCache<String>, ManualClock) {
    let clock = ManualClock::new(0);
    let cache = TtlCache::with_clock(&CacheConfig::new(capacity, ttl_ms), Arc::new(clock.clone()))
        .unwrap();
    (cache, clock)
}

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,32}"
}

/// Keys drawn from a small pool so operations collide often
fn pooled_key_strategy() -> impl Strategy<Value = String> {
    (0u8..8).prop_map(|n| format!("line-{}", n))
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}"
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    Advance { ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (pooled_key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        3 => pooled_key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => pooled_key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => (0u64..600).prop_map(|ms| CacheOp::Advance { ms }),
    ]
}

// == Reference Model ==
/// Recency-ordered list: index 0 is least recently used.
struct Model {
    order: Vec<(String, String, u64)>,
    capacity: usize,
    ttl_ms: u64,
}

impl Model {
    fn new(capacity: usize, ttl_ms: u64) -> Self {
        Self {
            order: Vec::new(),
            capacity,
            ttl_ms,
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.order.iter().position(|(k, _, _)| k == key)
    }

    fn set(&mut self, key: String, value: String, now: u64) {
        if let Some(idx) = self.position(&key) {
            self.order.remove(idx);
        } else if self.order.len() >= self.capacity {
            self.order.remove(0);
        }
        self.order.push((key, value, now));
    }

    fn get(&mut self, key: &str, now: u64) -> Option<String> {
        let idx = self.position(key)?;
        let item = self.order.remove(idx);
        if now - item.2 >= self.ttl_ms {
            return None;
        }
        let value = item.1.clone();
        self.order.push(item);
        Some(value)
    }

    fn delete(&mut self, key: &str) {
        if let Some(idx) = self.position(key) {
            self.order.remove(idx);
        }
    }

    fn keys(&self) -> Vec<String> {
        self.order.iter().map(|(k, _, _)| k.clone()).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // For any operation sequence, reads, key order and counters match the
    // reference model, and the capacity bound holds after every step.
    #[test]
    fn prop_matches_reference_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let (mut cache, clock) = cache_with_clock(capacity, TEST_TTL_MS);
        let mut model = Model::new(capacity, TEST_TTL_MS);
        let mut now = 0u64;
        let mut expected_hits = 0u64;
        let mut expected_misses = 0u64;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(key.clone(), value.clone());
                    model.set(key, value, now);
                }
                CacheOp::Get { key } => {
                    let actual = cache.get(&key);
                    let expected = model.get(&key, now);
                    match expected {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    }
                    prop_assert_eq!(actual, expected, "get({}) diverged", key);
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key);
                    model.delete(&key);
                }
                CacheOp::Advance { ms } => {
                    now += ms;
                    clock.set_ms(now);
                }
            }

            prop_assert!(cache.len() <= capacity, "Cache size {} exceeds {}", cache.len(), capacity);
            prop_assert_eq!(cache.keys(), model.keys());
        }

        let metrics = cache.metrics();
        prop_assert_eq!(metrics.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(metrics.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(metrics.size, cache.len());
    }

    // Storing then immediately reading returns the stored value.
    #[test]
    fn prop_read_after_write(key in key_strategy(), value in value_strategy()) {
        let (mut cache, _) = cache_with_clock(TEST_CAPACITY, TEST_TTL_MS);

        cache.set(key.clone(), value.clone());

        prop_assert_eq!(cache.get(&key), Some(value));
    }

    // A lookup of an absent key adds exactly one miss and no hits.
    #[test]
    fn prop_absent_key_is_one_miss(
        stored in prop::collection::vec(key_strategy(), 0..20),
        probe in key_strategy()
    ) {
        prop_assume!(!stored.contains(&probe));
        let (mut cache, _) = cache_with_clock(TEST_CAPACITY, TEST_TTL_MS);
        for key in &stored {
            cache.set(key.clone(), "v".to_string());
        }
        let before = cache.metrics();

        prop_assert_eq!(cache.get(&probe), None);

        let after = cache.metrics();
        prop_assert_eq!(after.misses, before.misses + 1);
        prop_assert_eq!(after.hits, before.hits);
    }

    // Inserting n+1 distinct keys into a cache of capacity n evicts the first key.
    #[test]
    fn prop_capacity_plus_one_evicts_oldest(
        keys in prop::collection::hash_set(key_strategy(), 2..20)
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let capacity = keys.len() - 1;
        let (mut cache, _) = cache_with_clock(capacity, TEST_TTL_MS);

        for key in &keys {
            cache.set(key.clone(), format!("value_{}", key));
        }

        prop_assert_eq!(cache.len(), capacity);
        prop_assert!(!cache.contains_live(&keys[0]), "Oldest key '{}' should be evicted", keys[0]);
        prop_assert_eq!(cache.keys(), keys[1..].to_vec());
    }

    // A read moves a key out of the eviction slot.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::hash_set(key_strategy(), 3..10),
        new_key in key_strategy()
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        prop_assume!(!keys.contains(&new_key));
        let (mut cache, _) = cache_with_clock(keys.len(), TEST_TTL_MS);

        for key in &keys {
            cache.set(key.clone(), format!("value_{}", key));
        }
        cache.get(&keys[0]);
        cache.set(new_key.clone(), "new".to_string());

        prop_assert!(cache.contains_live(&keys[0]), "Accessed key should survive");
        prop_assert!(!cache.contains_live(&keys[1]), "Second key is now the oldest");
        prop_assert!(cache.contains_live(&new_key));
    }

    // Visible at ttl - 1, gone (and purged) at ttl or later.
    #[test]
    fn prop_ttl_boundary(
        key in key_strategy(),
        value in value_strategy(),
        ttl_ms in 1u64..100_000,
        start in 0u64..1_000_000,
        overshoot in 0u64..10_000
    ) {
        let (mut cache, clock) = cache_with_clock(TEST_CAPACITY, ttl_ms);
        clock.set_ms(start);
        cache.set(key.clone(), value.clone());

        clock.set_ms(start + ttl_ms - 1);
        prop_assert_eq!(cache.get(&key), Some(value));

        clock.set_ms(start + ttl_ms + overshoot);
        prop_assert_eq!(cache.get(&key), None);
        prop_assert!(!cache.keys().contains(&key));
    }

    // clear() empties the cache but leaves lifetime counters alone.
    #[test]
    fn prop_clear_keeps_counters(
        keys in prop::collection::vec(key_strategy(), 1..30),
        probes in prop::collection::vec(key_strategy(), 0..30)
    ) {
        let (mut cache, clock) = cache_with_clock(TEST_CAPACITY, TEST_TTL_MS);
        for key in &keys {
            cache.set(key.clone(), "v".to_string());
        }
        clock.advance(Duration::from_millis(10));
        for probe in &probes {
            cache.get(probe);
        }
        let before = cache.metrics();

        cache.clear();

        let after = cache.metrics();
        prop_assert_eq!(after.size, 0);
        prop_assert!(cache.keys().is_empty());
        prop_assert_eq!(after.hits, before.hits);
        prop_assert_eq!(after.misses, before.misses);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Same arguments give the same key; different identifiers give different keys.
    #[test]
    fn prop_key_derivation(
        prefix in "[a-z:\\\\]{0,8}",
        id_a in ".{0,32}",
        id_b in ".{0,32}"
    ) {
        prop_assert_eq!(generate_cache_key(&prefix, &id_a), generate_cache_key(&prefix, &id_a));
        if id_a != id_b {
            prop_assert_ne!(generate_cache_key(&prefix, &id_a), generate_cache_key(&prefix, &id_b));
        }
    }

    // Distinct (prefix, identifier) pairs never collide, even with separators in the prefix.
    #[test]
    fn prop_key_derivation_injective(
        pairs in prop::collection::hash_set(("[a-z:\\\\]{0,4}", "[a-z:\\\\]{0,4}"), 1..40)
    ) {
        let keys: HashSet<String> = pairs
            .iter()
            .map(|(prefix, id)| generate_cache_key(prefix, id))
            .collect();
        prop_assert_eq!(keys.len(), pairs.len());
    }

    // Fingerprints of different field values never collide.
    #[test]
    fn prop_fingerprint_distinct(
        text_a in "[a-z|=\\\\ ]{0,16}",
        text_b in "[a-z|=\\\\ ]{0,16}",
        voice in "[a-z|=]{0,8}"
    ) {
        let a = RequestFingerprint::new().field("text", &text_a).field("voice", &voice);
        let b = RequestFingerprint::new().field("text", &text_b).field("voice", &voice);
        prop_assert_eq!(a == b, text_a == text_b);
    }
}

// Separate block: each case spins up a runtime
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // Any number of callers racing on one cold key cause exactly one computation
    // and all see the same value.
    #[test]
    fn prop_coalesced_callers_share_one_computation(
        callers in 1usize..24,
        key in key_strategy(),
        value in value_strategy()
    ) {
        use crate::fetch::CachedFetcher;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let results = tokio_test::block_on(async {
            let fetcher: Arc<CachedFetcher<String, String>> =
                Arc::new(CachedFetcher::new(&CacheConfig::new(TEST_CAPACITY, TEST_TTL_MS)).unwrap());

            let mut handles = Vec::new();
            for _ in 0..callers {
                let fetcher = Arc::clone(&fetcher);
                let calls = Arc::clone(&calls);
                let key = key.clone();
                let value = value.clone();
                handles.push(tokio::spawn(async move {
                    fetcher
                        .get_or_fetch(&key, move || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(5)).await;
                            Ok(value)
                        })
                        .await
                }));
            }

            let mut results = Vec::new();
            for handle in handles {
                results.push(handle.await.unwrap());
            }
            results
        });

        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
        prop_assert!(results.iter().all(|r| r.as_ref() == Ok(&value)));
    }
}
