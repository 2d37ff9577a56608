//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against a plain HashMap model.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::cache::Cache;
use crate::error::CacheError;
use crate::query::{Comparator, IntQuery, Value};

// == Strategies ==
/// Generates cache keys from a small alphabet so operations collide
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}".prop_map(|s| s)
}

/// A single cache operation
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Any sequence of set/get/delete leaves the cache agreeing with a HashMap
    // model, and every get observes the model's answer.
    #[test]
    fn prop_matches_hashmap_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        tokio_test::block_on(async {
            let cache: Cache<String, String> = Cache::new();
            let mut model: HashMap<String, String> = HashMap::new();

            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(key.clone(), value.clone()).await.unwrap();
                        model.insert(key, value);
                    }
                    CacheOp::Get { key } => {
                        match (cache.get(&key).await, model.get(&key)) {
                            (Ok(found), Some(expected)) => assert_eq!(&found, expected),
                            (Err(CacheError::NotFound(_)), None) => {}
                            (other, expected) => panic!("get {:?}: {:?} vs {:?}", key, other, expected),
                        }
                    }
                    CacheOp::Delete { key } => {
                        cache.delete(&key).await.unwrap();
                        model.remove(&key);
                    }
                }
            }

            assert_eq!(cache.copy().await, model);
        });
    }

    // After a set, a get returns the value just written.
    #[test]
    fn prop_read_your_write(key in key_strategy(), value in value_strategy()) {
        let found = tokio_test::block_on(async {
            let cache = Cache::new();
            cache.set(key.clone(), value.clone()).await.unwrap();
            cache.get(&key).await.unwrap()
        });
        prop_assert_eq!(found, value);
    }

    // After a delete, the key neither exists nor is listed.
    #[test]
    fn prop_delete_removes_entry(key in key_strategy(), value in value_strategy()) {
        let (exists, keys) = tokio_test::block_on(async {
            let cache = Cache::new();
            cache.set(key.clone(), value).await.unwrap();
            cache.delete(&key).await.unwrap();
            (cache.exists(&key).await.unwrap(), cache.keys().await)
        });
        prop_assert!(!exists);
        prop_assert!(!keys.contains(&key));
    }

    // Integer comparators agree with i64 ordering, for scalars and any-element lists.
    #[test]
    fn prop_int_query_agrees_with_ordering(reference in -50i64..50, candidate in -50i64..50, extra in -50i64..50) {
        let gte = IntQuery::new(reference, Comparator::GreaterEq);
        let lt = IntQuery::new(reference, Comparator::Less);

        prop_assert_eq!(gte.matches(&Value::from(candidate)), candidate >= reference);
        prop_assert_eq!(lt.matches(&Value::from(candidate)), candidate < reference);
        prop_assert_eq!(
            gte.matches(&Value::from(vec![candidate, extra])),
            candidate >= reference || extra >= reference
        );
    }
}
