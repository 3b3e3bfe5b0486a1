//! In-memory implementation of the Store trait.
//!
//! Same semantics as SQLite, no persistence. Batches apply under a single
//! write lock, so readers never observe half of a batch.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use authorizer_core::{Account, ChangeBatch, Condition, Mutation, Permission, PermissionKey};

use crate::error::{Result, StoreError};
use crate::traits::{CommitReport, GrantResult, PermissionReader, RevokeResult, Store};

type Table = BTreeMap<PermissionKey, Vec<Condition>>;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    permissions: RwLock<Table>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Table>> {
        self.permissions
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Table>> {
        self.permissions
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

fn grant_in(table: &mut Table, key: &PermissionKey, conditions: &[Condition]) -> GrantResult {
    match table.insert(*key, conditions.to_vec()) {
        Some(_) => GrantResult::Replaced,
        None => GrantResult::Created,
    }
}

fn revoke_in(table: &mut Table, key: &PermissionKey) -> RevokeResult {
    match table.remove(key) {
        Some(_) => RevokeResult::Revoked,
        None => RevokeResult::Absent,
    }
}

impl PermissionReader for MemoryStore {
    fn get_permission(&self, key: &PermissionKey) -> Result<Option<Vec<Condition>>> {
        Ok(self.read()?.get(key).cloned())
    }
}

impl Store for MemoryStore {
    fn grant(&self, key: &PermissionKey, conditions: &[Condition]) -> Result<GrantResult> {
        let mut table = self.write()?;
        Ok(grant_in(&mut table, key, conditions))
    }

    fn revoke(&self, key: &PermissionKey) -> Result<RevokeResult> {
        let mut table = self.write()?;
        Ok(revoke_in(&mut table, key))
    }

    fn commit(&self, batch: &ChangeBatch) -> Result<CommitReport> {
        let mut table = self.write()?;
        let mut report = CommitReport::default();

        for mutation in batch {
            match mutation {
                Mutation::Grant { key, conditions } => {
                    report.record_grant(grant_in(&mut table, key, conditions));
                }
                Mutation::Revoke { key } => {
                    report.record_revoke(revoke_in(&mut table, key));
                }
            }
        }

        tracing::debug!(mutations = batch.len(), ?report, "committed batch to memory store");
        Ok(report)
    }

    fn permissions_on(&self, target: &Account) -> Result<Vec<Permission>> {
        Ok(self
            .read()?
            .iter()
            .filter(|(key, _)| &key.target == target)
            .map(|(key, conditions)| Permission::new(*key, conditions.clone()))
            .collect())
    }

    fn permissions_of(&self, who: &Account, target: &Account) -> Result<Vec<Permission>> {
        Ok(self
            .read()?
            .iter()
            .filter(|(key, _)| &key.who == who && &key.target == target)
            .map(|(key, conditions)| Permission::new(*key, conditions.clone()))
            .collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
