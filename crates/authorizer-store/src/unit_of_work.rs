//! Pending changes layered over a store.
//!
//! A [`UnitOfWork`] stages grants and revokes without touching the store.
//! Reads through it see the staged state, so checks made later in the same
//! unit observe earlier changes. Nothing reaches the store until
//! [`UnitOfWork::commit`], which applies everything as one batch.

use std::collections::BTreeMap;

use authorizer_core::{ChangeBatch, Condition, Mutation, PermissionKey};

use crate::error::Result;
use crate::traits::{CommitReport, PermissionReader, Store};

/// Staged permission changes over a backing store.
pub struct UnitOfWork<'s, S: Store + ?Sized> {
    store: &'s S,
    /// Latest staged value per key; `None` marks a staged revoke.
    overlay: BTreeMap<PermissionKey, Option<Vec<Condition>>>,
    pending: ChangeBatch,
}

impl<'s, S: Store + ?Sized> UnitOfWork<'s, S> {
    /// Begin a unit of work over `store`.
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            overlay: BTreeMap::new(),
            pending: ChangeBatch::new(),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &'s S {
        self.store
    }

    /// Stage a grant.
    pub fn grant(&mut self, key: PermissionKey, conditions: Vec<Condition>) {
        self.overlay.insert(key, Some(conditions.clone()));
        self.pending.grant(key, conditions);
    }

    /// Stage a revoke.
    pub fn revoke(&mut self, key: PermissionKey) {
        self.overlay.insert(key, None);
        self.pending.revoke(key);
    }

    /// Stage every mutation of `batch`, in order.
    pub fn apply(&mut self, batch: &ChangeBatch) {
        for mutation in batch {
            match mutation {
                Mutation::Grant { key, conditions } => self.grant(*key, conditions.clone()),
                Mutation::Revoke { key } => self.revoke(*key),
            }
        }
    }

    /// The staged mutations, in order.
    pub fn pending(&self) -> &ChangeBatch {
        &self.pending
    }

    /// Whether anything is staged.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Apply the staged mutations to the store as one atomic batch.
    pub fn commit(self) -> Result<CommitReport> {
        if self.pending.is_empty() {
            return Ok(CommitReport::default());
        }
        self.store.commit(&self.pending)
    }

    /// Drop the staged mutations without applying them.
    pub fn discard(self) {
        tracing::debug!(mutations = self.pending.len(), "discarded unit of work");
    }
}

impl<S: Store + ?Sized> PermissionReader for UnitOfWork<'_, S> {
    fn get_permission(&self, key: &PermissionKey) -> Result<Option<Vec<Condition>>> {
        match self.overlay.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.store.get_permission(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use authorizer_core::{Account, Operation};
    use proptest::prelude::*;

    fn key(who: u8) -> PermissionKey {
        PermissionKey::new(
            Account::from_bytes([who; 20]),
            Account::from_bytes([9; 20]),
            Operation::resolve("pause()"),
        )
    }

    #[test]
    fn test_reads_see_staged_changes() {
        let store = MemoryStore::new();
        store.grant(&key(1), &[]).unwrap();

        let mut unit = UnitOfWork::new(&store);
        unit.revoke(key(1));
        unit.grant(key(2), vec![Condition::eq(3u64)]);

        assert!(!unit.is_granted(&key(1)).unwrap());
        assert_eq!(unit.get_permission(&key(2)).unwrap(), Some(vec![Condition::eq(3u64)]));

        // Store is untouched until commit.
        assert!(store.is_granted(&key(1)).unwrap());
        assert!(!store.is_granted(&key(2)).unwrap());
    }

    #[test]
    fn test_commit_applies_everything() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::new(&store);
        unit.grant(key(1), vec![]);
        unit.grant(key(2), vec![]);
        unit.revoke(key(1));

        let report = unit.commit().unwrap();
        assert_eq!(report.total(), 3);
        assert!(!store.is_granted(&key(1)).unwrap());
        assert!(store.is_granted(&key(2)).unwrap());
    }

    #[test]
    fn test_discard_leaves_store_unchanged() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::new(&store);
        unit.grant(key(1), vec![]);
        unit.discard();

        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_apply_batch_in_order() {
        let store = MemoryStore::new();
        let mut batch = ChangeBatch::new();
        batch.grant(key(1), vec![]);
        batch.revoke(key(1));

        let mut unit = UnitOfWork::new(&store);
        unit.apply(&batch);
        assert_eq!(unit.pending(), &batch);
        assert!(!unit.is_granted(&key(1)).unwrap());
    }

    #[test]
    fn test_works_over_trait_object() {
        let store = MemoryStore::new();
        let dyn_store: &dyn Store = &store;

        let mut unit = UnitOfWork::new(dyn_store);
        unit.grant(key(1), vec![]);
        unit.commit().unwrap();
        assert!(store.is_granted(&key(1)).unwrap());
    }

    proptest! {
        #[test]
        fn test_staged_reads_match_committed_state(
            seeded in prop::collection::vec(0u8..4, 0..4),
            staged in prop::collection::vec((0u8..4, prop::option::of(0u64..3)), 0..12),
        ) {
            let store = MemoryStore::new();
            for who in &seeded {
                store.grant(&key(*who), &[]).unwrap();
            }

            let mut unit = UnitOfWork::new(&store);
            for (who, literal) in &staged {
                match literal {
                    Some(value) => unit.grant(key(*who), vec![Condition::eq(*value)]),
                    None => unit.revoke(key(*who)),
                }
            }
            let before: Vec<_> = (0..4u8)
                .map(|who| unit.get_permission(&key(who)).unwrap())
                .collect();

            unit.commit().unwrap();
            let after: Vec<_> = (0..4u8)
                .map(|who| store.get_permission(&key(who)).unwrap())
                .collect();
            prop_assert_eq!(before, after);
        }
    }
}
