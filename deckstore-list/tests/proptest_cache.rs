use std::collections::HashSet;

use deckstore_list::BoundedCache;
use deckstore_types::{DocumentId, Identifiable};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Item(DocumentId);

impl Identifiable for Item {
    fn id(&self) -> &DocumentId {
        &self.0
    }
}

#[derive(Debug, Clone)]
enum Op {
    Initial(Vec<u8>),
    New(Vec<u8>),
    Old(Vec<u8>),
    Delete(Vec<u8>),
    Clear,
}

fn items(keys: &[u8]) -> Vec<Item> {
    keys.iter().map(|k| Item(DocumentId::new(format!("k{k}")))).collect()
}

fn ids(keys: &[u8]) -> Vec<DocumentId> {
    keys.iter().map(|k| DocumentId::new(format!("k{k}"))).collect()
}

fn arb_keys() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..24, 0..12)
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => arb_keys().prop_map(Op::Initial),
        3 => arb_keys().prop_map(Op::New),
        2 => arb_keys().prop_map(Op::Old),
        1 => arb_keys().prop_map(Op::Delete),
        1 => Just(Op::Clear),
    ]
}

fn apply(cache: &mut BoundedCache<Item>, op: &Op) {
    match op {
        Op::Initial(keys) => cache.store_initial_data(items(keys)),
        Op::New(keys) => cache.store_new_items(items(keys)),
        Op::Old(keys) => cache.store_old_items(items(keys)),
        Op::Delete(keys) => cache.delete_items(&ids(keys)),
        Op::Clear => cache.clear_cache(),
    }
}

proptest! {
    #[test]
    fn capacity_and_uniqueness_hold_after_every_operation(
        capacity in 0usize..10,
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let mut cache = BoundedCache::new(capacity);
        for op in &ops {
            apply(&mut cache, op);

            let keys: Vec<DocumentId> = cache.keys().cloned().collect();
            let unique: HashSet<&DocumentId> = keys.iter().collect();
            prop_assert!(cache.len() <= capacity);
            prop_assert_eq!(unique.len(), keys.len());

            let items = cache.retrieve_items();
            prop_assert_eq!(items.len(), keys.len());
            for (item, key) in items.iter().zip(&keys) {
                prop_assert_eq!(item.id(), key);
                prop_assert!(cache.retrieve_item(key).is_some());
            }
        }
    }

    #[test]
    fn new_items_land_at_head_in_order(
        capacity in 1usize..10,
        seed in arb_keys(),
        fresh in arb_keys(),
    ) {
        let mut cache = BoundedCache::new(capacity);
        cache.store_initial_data(items(&seed));
        cache.store_new_items(items(&fresh));

        let mut expected_head: Vec<DocumentId> = Vec::new();
        for id in ids(&fresh) {
            if !expected_head.contains(&id) {
                expected_head.push(id);
            }
        }
        expected_head.truncate(capacity);

        let head: Vec<DocumentId> = cache.keys().take(expected_head.len()).cloned().collect();
        prop_assert_eq!(head, expected_head);
    }

    #[test]
    fn reads_never_change_order(
        capacity in 1usize..10,
        seed in arb_keys(),
        probes in arb_keys(),
    ) {
        let mut cache = BoundedCache::new(capacity);
        cache.store_initial_data(items(&seed));
        let before: Vec<DocumentId> = cache.keys().cloned().collect();
        for id in ids(&probes) {
            let _ = cache.retrieve_item(&id);
        }
        let after: Vec<DocumentId> = cache.keys().cloned().collect();
        prop_assert_eq!(before, after);
    }
}
