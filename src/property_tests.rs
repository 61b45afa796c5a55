//! Randomized operation sequences checked against a map-based model.
//!
//! The cache under test is large enough that nothing is evicted, so the
//! model and the cache must agree exactly.

use std::collections::HashMap;

use proptest::prelude::*;

use crate::{Cache, CacheError};

/// Big enough that no generated sequence triggers eviction.
const MODEL_CAPACITY: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
enum CacheOp {
    Set(Vec<u8>, Vec<u8>),
    Get(Vec<u8>),
    Del(Vec<u8>),
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    (0..40u32).prop_map(|i| format!("key{i}").into_bytes())
}

fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..128)
}

fn op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(k, v)| CacheOp::Set(k, v)),
        key_strategy().prop_map(CacheOp::Get),
        key_strategy().prop_map(CacheOp::Del),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn matches_map_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let cache = Cache::new(MODEL_CAPACITY);
        let mut model: HashMap<Vec<u8>, Vec<u8>> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set(key, value) => {
                    cache.set(&key, &value, 0).unwrap();
                    model.insert(key, value);
                }
                CacheOp::Get(key) => {
                    match model.get(&key) {
                        Some(expected) => prop_assert_eq!(&cache.get(&key).unwrap(), expected),
                        None => prop_assert_eq!(cache.get(&key), Err(CacheError::NotFound)),
                    }
                }
                CacheOp::Del(key) => {
                    prop_assert_eq!(cache.del(&key), model.remove(&key).is_some());
                }
            }
        }

        for (key, expected) in &model {
            prop_assert_eq!(&cache.get(key).unwrap(), expected);
        }
        prop_assert_eq!(cache.entry_count(), model.len() as u64);
    }

    #[test]
    fn statistics_track_lookups(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let cache = Cache::new(MODEL_CAPACITY);
        let mut model: HashMap<Vec<u8>, Vec<u8>> = HashMap::new();
        let mut expected_hits = 0u64;
        let mut expected_misses = 0u64;

        for op in ops {
            match op {
                CacheOp::Set(key, value) => {
                    cache.set(&key, &value, 0).unwrap();
                    model.insert(key, value);
                }
                CacheOp::Get(key) => {
                    if model.contains_key(&key) {
                        expected_hits += 1;
                    } else {
                        expected_misses += 1;
                    }
                    let _ = cache.get(&key);
                }
                CacheOp::Del(key) => {
                    model.remove(&key);
                    cache.del(&key);
                }
            }
        }

        prop_assert_eq!(cache.hit_count(), expected_hits);
        prop_assert_eq!(cache.miss_count(), expected_misses);
        prop_assert_eq!(cache.lookup_count(), expected_hits + expected_misses);
        prop_assert_eq!(cache.corruption_count(), 0);
    }

    #[test]
    fn overwrites_never_change_entry_count(
        key in key_strategy(),
        values in prop::collection::vec(value_strategy(), 1..10),
    ) {
        let cache = Cache::new(MODEL_CAPACITY);
        for value in &values {
            cache.set(&key, value, 0).unwrap();
            prop_assert_eq!(cache.entry_count(), 1);
        }
        prop_assert_eq!(&cache.get(&key).unwrap(), values.last().unwrap());
    }
}
