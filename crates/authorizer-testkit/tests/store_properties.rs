//! Property tests: both store backends agree with a simple model on every
//! batch.

use std::collections::BTreeMap;

use authorizer_core::{Account, ChangeBatch, Condition, Mutation, PermissionKey};
use authorizer_store::{MemoryStore, PermissionReader, SqliteStore, Store};
use authorizer_testkit::generators::{change_batch, permission_key};
use proptest::prelude::*;

fn model(batch: &ChangeBatch) -> BTreeMap<PermissionKey, Vec<Condition>> {
    let mut table = BTreeMap::new();
    for mutation in batch {
        match mutation {
            Mutation::Grant { key, conditions } => {
                table.insert(*key, conditions.clone());
            }
            Mutation::Revoke { key } => {
                table.remove(key);
            }
        }
    }
    table
}

fn snapshot(store: &dyn Store) -> BTreeMap<PermissionKey, Vec<Condition>> {
    (0..2u8)
        .flat_map(|t| store.permissions_on(&Account::from_bytes([t; 20])).unwrap())
        .map(|p| (p.key, p.conditions))
        .collect()
}

proptest! {
    #[test]
    fn test_backends_match_model(batch in change_batch(24)) {
        let memory = MemoryStore::new();
        let sqlite = SqliteStore::open_memory().unwrap();

        let from_memory = memory.commit(&batch).unwrap();
        let from_sqlite = sqlite.commit(&batch).unwrap();
        prop_assert_eq!(from_memory, from_sqlite);
        prop_assert_eq!(from_memory.total(), batch.len());

        let expected = model(&batch);
        prop_assert_eq!(snapshot(&memory), expected.clone());
        prop_assert_eq!(snapshot(&sqlite), expected.clone());
        prop_assert_eq!(memory.count().unwrap(), expected.len());
    }

    #[test]
    fn test_last_mutation_wins(batch in change_batch(16), key in permission_key()) {
        let store = MemoryStore::new();
        store.commit(&batch).unwrap();

        let last = batch.iter().rev().find(|m| m.key() == &key);
        let granted = store.is_granted(&key).unwrap();
        match last {
            Some(Mutation::Grant { conditions, .. }) => {
                prop_assert!(granted);
                prop_assert_eq!(&store.get_conditions(&key).unwrap(), conditions);
            }
            Some(Mutation::Revoke { .. }) | None => prop_assert!(!granted),
        }
    }
}
