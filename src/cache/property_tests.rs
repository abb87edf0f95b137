//! Property-Based Tests for Cache Module
//!
//! Uses proptest to drive the store with random operation sequences on a
//! synthetic clock and checks its structural invariants after every step.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{CacheStore, EjectionReason, TracingEjectionLog};

// == Test Configuration ==
const TEST_DEFAULT_TTL: Duration = Duration::from_millis(50);

// == Strategies ==
/// Small key space so that operations collide often
fn key_strategy() -> impl Strategy<Value = u8> {
    0u8..24
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: u8, value: u32, ttl_ms: u64 },
    PutDefault { key: u8, value: u32 },
    Get { key: u8 },
    Refresh { key: u8 },
    Remove { key: u8 },
    Advance { ms: u64 },
    Sweep,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), any::<u32>(), 0u64..100)
            .prop_map(|(key, value, ttl_ms)| CacheOp::Put { key, value, ttl_ms }),
        1 => (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::PutDefault { key, value }),
        3 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Refresh { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Remove { key }),
        2 => (0u64..30).prop_map(|ms| CacheOp::Advance { ms }),
        1 => Just(CacheOp::Sweep),
    ]
}

fn new_store(max: usize) -> CacheStore<u8, u32> {
    CacheStore::new(max, TEST_DEFAULT_TTL, "proptest", Arc::new(TracingEjectionLog)).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // For any sequence of operations, the table and both lists agree, the
    // expiration list stays sorted and the size never exceeds the bound.
    #[test]
    fn prop_invariants_hold_after_every_operation(
        max in 1usize..12,
        ops in prop::collection::vec(cache_op_strategy(), 1..150)
    ) {
        let mut store = new_store(max);
        let mut now = Instant::now();

        for op in ops {
            match op {
                CacheOp::Put { key, value, ttl_ms } => {
                    store.put(key, value, Duration::from_millis(ttl_ms), now);
                }
                CacheOp::PutDefault { key, value } => {
                    store.put(key, value, TEST_DEFAULT_TTL, now);
                }
                CacheOp::Get { key } => {
                    store.get(&key, now);
                }
                CacheOp::Refresh { key } => {
                    store.refresh(&key, now);
                }
                CacheOp::Remove { key } => {
                    store.remove(&key);
                }
                CacheOp::Advance { ms } => {
                    now += Duration::from_millis(ms);
                }
                CacheOp::Sweep => {
                    store.clear_stale(now, EjectionReason::Reaped);
                }
            }
            store.assert_invariants();
            prop_assert!(store.len() <= max);
        }
    }

    // The store agrees with a simple reference model: a map of key to
    // (value, expiry) plus a recency vector.
    #[test]
    fn prop_matches_reference_model(
        max in 1usize..8,
        ops in prop::collection::vec(cache_op_strategy(), 1..120)
    ) {
        let mut store = new_store(max);
        let start = Instant::now();
        let mut now = start;
        let mut model: HashMap<u8, (u32, Instant)> = HashMap::new();
        let mut recency: Vec<u8> = Vec::new();

        fn touch(recency: &mut Vec<u8>, key: u8) {
            recency.retain(|k| *k != key);
            recency.push(key);
        }

        for op in ops {
            match op {
                CacheOp::Put { key, value, ttl_ms } => {
                    model_put(&mut model, &mut recency, max, key, value, now + Duration::from_millis(ttl_ms), now);
                    store.put(key, value, Duration::from_millis(ttl_ms), now);
                }
                CacheOp::PutDefault { key, value } => {
                    model_put(&mut model, &mut recency, max, key, value, now + TEST_DEFAULT_TTL, now);
                    store.put(key, value, TEST_DEFAULT_TTL, now);
                }
                CacheOp::Get { key } => {
                    let expected = match model.get(&key) {
                        Some(&(value, expires_at)) if expires_at > now => {
                            touch(&mut recency, key);
                            Some(value)
                        }
                        Some(_) => {
                            model.remove(&key);
                            recency.retain(|k| *k != key);
                            None
                        }
                        None => None,
                    };
                    prop_assert_eq!(store.get(&key, now), expected);
                }
                CacheOp::Refresh { key } => {
                    let expected = if let Some(entry) = model.get_mut(&key) {
                        entry.1 = now + TEST_DEFAULT_TTL;
                        touch(&mut recency, key);
                        true
                    } else {
                        false
                    };
                    prop_assert_eq!(store.refresh(&key, now), expected);
                }
                CacheOp::Remove { key } => {
                    let expected = model.remove(&key).map(|(value, _)| value);
                    recency.retain(|k| *k != key);
                    prop_assert_eq!(store.remove(&key), expected);
                }
                CacheOp::Advance { ms } => {
                    now += Duration::from_millis(ms);
                }
                CacheOp::Sweep => {
                    model_sweep(&mut model, &mut recency, now);
                    store.clear_stale(now, EjectionReason::Reaped);
                }
            }

            prop_assert_eq!(store.recency_keys(), recency.clone());
            let keys: HashSet<u8> = model.keys().copied().collect();
            prop_assert_eq!(store.keys(), keys);
        }
    }

    // Inserting one more live entry than the bound evicts the least
    // recently touched entry.
    #[test]
    fn prop_lru_eviction_order(
        keys in prop::collection::hash_set(key_strategy(), 2..10),
        touched in any::<prop::sample::Index>(),
        new_key in 100u8..200
    ) {
        let keys: Vec<u8> = keys.into_iter().collect();
        let capacity = keys.len();
        let mut store = new_store(capacity);
        let now = Instant::now();

        for key in &keys {
            store.put(*key, u32::from(*key), Duration::from_secs(60), now);
        }

        // Touch one key; the oldest untouched key becomes the victim
        let touched = keys[touched.index(keys.len())];
        store.get(&touched, now);
        let victim = *keys.iter().find(|k| **k != touched).unwrap();

        store.put(new_key, 0, Duration::from_secs(60), now);

        prop_assert_eq!(store.len(), capacity);
        prop_assert_eq!(store.get(&victim, now), None);
        prop_assert!(store.get(&touched, now).is_some());
        prop_assert!(store.get(&new_key, now).is_some());
    }

    // Storing a pair and reading it back before expiry returns it unchanged.
    #[test]
    fn prop_roundtrip_storage(key in any::<u8>(), value in any::<u32>(), ttl_ms in 1u64..10_000) {
        let mut store = new_store(4);
        let now = Instant::now();

        store.put(key, value, Duration::from_millis(ttl_ms), now);
        prop_assert_eq!(store.get(&key, now), Some(value));
        prop_assert_eq!(store.get(&key, now + Duration::from_millis(ttl_ms)), None);
    }
}

fn model_sweep(model: &mut HashMap<u8, (u32, Instant)>, recency: &mut Vec<u8>, now: Instant) {
    model.retain(|_, (_, expires_at)| *expires_at > now);
    recency.retain(|k| model.contains_key(k));
}

fn model_put(
    model: &mut HashMap<u8, (u32, Instant)>,
    recency: &mut Vec<u8>,
    max: usize,
    key: u8,
    value: u32,
    expires_at: Instant,
    now: Instant,
) {
    if model.contains_key(&key) {
        model.insert(key, (value, expires_at));
        recency.retain(|k| *k != key);
        recency.push(key);
        return;
    }
    if model.len() >= max {
        model_sweep(model, recency, now);
    }
    while model.len() >= max {
        let victim = recency.remove(0);
        model.remove(&victim);
    }
    model.insert(key, (value, expires_at));
    recency.push(key);
}
