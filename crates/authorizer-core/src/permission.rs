//! Permissions and the primitive mutations that change them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::condition::Condition;
use crate::operation::Operation;
use crate::types::Account;

/// The key a permission is stored under.
///
/// `target` is the module the permission is scoped to (the "where").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionKey {
    /// The caller being authorized.
    pub who: Account,
    /// The module the permission applies to.
    #[serde(rename = "where")]
    pub target: Account,
    /// The guarded operation.
    pub what: Operation,
}

impl PermissionKey {
    /// Create a key.
    pub fn new(who: Account, target: Account, what: Operation) -> Self {
        Self { who, target, what }
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}::{}", self.who, self.target, self.what)
    }
}

/// A stored permission: a key and its condition list.
///
/// An empty condition list is an unconditional grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(flatten)]
    pub key: PermissionKey,
    pub conditions: Vec<Condition>,
}

impl Permission {
    /// Create a permission.
    pub fn new(key: PermissionKey, conditions: Vec<Condition>) -> Self {
        Self { key, conditions }
    }

    /// Whether the permission carries no conditions.
    pub fn is_unconditional(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// A primitive change to the permission table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Create or overwrite the permission at `key`.
    Grant {
        key: PermissionKey,
        conditions: Vec<Condition>,
    },
    /// Delete the permission at `key`, if any.
    Revoke { key: PermissionKey },
}

impl Mutation {
    /// The key this mutation touches.
    pub fn key(&self) -> &PermissionKey {
        match self {
            Mutation::Grant { key, .. } | Mutation::Revoke { key } => key,
        }
    }

    /// Whether this is a grant.
    pub fn is_grant(&self) -> bool {
        matches!(self, Mutation::Grant { .. })
    }
}

/// An ordered list of mutations that commit together.
///
/// Order is significant: applying the batch front to back must produce the
/// committed state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    mutations: Vec<Mutation>,
}

impl ChangeBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a grant.
    pub fn grant(&mut self, key: PermissionKey, conditions: Vec<Condition>) {
        self.mutations.push(Mutation::Grant { key, conditions });
    }

    /// Append a revoke.
    pub fn revoke(&mut self, key: PermissionKey) {
        self.mutations.push(Mutation::Revoke { key });
    }

    /// Append every mutation of another batch.
    pub fn extend(&mut self, other: ChangeBatch) {
        self.mutations.extend(other.mutations);
    }

    /// The mutations, in order.
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Iterate the mutations in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Mutation> {
        self.mutations.iter()
    }

    /// Number of mutations.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

impl<'a> IntoIterator for &'a ChangeBatch {
    type Item = &'a Mutation;
    type IntoIter = std::slice::Iter<'a, Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.iter()
    }
}

impl FromIterator<Mutation> for ChangeBatch {
    fn from_iter<I: IntoIterator<Item = Mutation>>(iter: I) -> Self {
        Self {
            mutations: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8) -> PermissionKey {
        PermissionKey::new(
            Account::from_bytes([seed; 20]),
            Account::from_bytes([0xee; 20]),
            Operation::resolve("pause()"),
        )
    }

    #[test]
    fn test_batch_keeps_order() {
        let mut batch = ChangeBatch::new();
        batch.grant(key(1), vec![]);
        batch.revoke(key(1));
        batch.grant(key(2), vec![Condition::eq(5u64)]);

        let kinds: Vec<bool> = batch.iter().map(Mutation::is_grant).collect();
        assert_eq!(kinds, vec![true, false, true]);
        assert_eq!(batch.mutations()[1].key(), &key(1));
    }

    #[test]
    fn test_permission_json_uses_where() {
        let permission = Permission::new(key(1), vec![]);
        let json = serde_json::to_value(&permission).unwrap();
        assert!(json.get("where").is_some());
        assert!(json.get("target").is_none());
        assert!(permission.is_unconditional());
    }
}
