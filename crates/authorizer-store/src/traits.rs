//! Store traits: the abstract interface for permission persistence.
//!
//! This lets the gate stay storage-agnostic. Implementations include SQLite
//! (durable) and in-memory (tests, embedding).

use authorizer_core::{Account, ChangeBatch, Condition, Permission, PermissionKey};

use crate::error::Result;

/// Result of a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantResult {
    /// No permission existed at the key.
    Created,
    /// An existing condition list was overwritten.
    Replaced,
}

/// Result of a revoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeResult {
    /// The permission was deleted.
    Revoked,
    /// Nothing was stored at the key (idempotent - not an error).
    Absent,
}

/// Summary of a committed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Grants that created a new permission.
    pub created: usize,
    /// Grants that overwrote an existing permission.
    pub replaced: usize,
    /// Revokes that deleted a permission.
    pub revoked: usize,
    /// Revokes of keys that were not stored.
    pub absent: usize,
}

impl CommitReport {
    /// Count a grant outcome.
    pub fn record_grant(&mut self, result: GrantResult) {
        match result {
            GrantResult::Created => self.created += 1,
            GrantResult::Replaced => self.replaced += 1,
        }
    }

    /// Count a revoke outcome.
    pub fn record_revoke(&mut self, result: RevokeResult) {
        match result {
            RevokeResult::Revoked => self.revoked += 1,
            RevokeResult::Absent => self.absent += 1,
        }
    }

    /// Total number of mutations applied.
    pub fn total(&self) -> usize {
        self.created + self.replaced + self.revoked + self.absent
    }
}

/// Read access to a permission table.
///
/// Implemented by stores and by [`UnitOfWork`](crate::UnitOfWork), so the
/// gate can decide against either committed or in-flight state.
pub trait PermissionReader {
    /// Look up the condition list stored at `key`.
    ///
    /// `None` means no permission; `Some(vec![])` is an unconditional grant.
    fn get_permission(&self, key: &PermissionKey) -> Result<Option<Vec<Condition>>>;

    /// Whether a permission is stored at `key`.
    fn is_granted(&self, key: &PermissionKey) -> Result<bool> {
        Ok(self.get_permission(key)?.is_some())
    }

    /// The conditions stored at `key`, empty when not granted.
    ///
    /// An empty list alone does not mean "allowed"; combine with
    /// [`is_granted`](Self::is_granted).
    fn get_conditions(&self, key: &PermissionKey) -> Result<Vec<Condition>> {
        Ok(self.get_permission(key)?.unwrap_or_default())
    }
}

/// The Store trait: durable mapping from permission keys to condition lists.
///
/// # Design Notes
///
/// - **Overwrite**: `grant` on an existing key replaces its conditions.
/// - **Idempotent revoke**: revoking an absent key returns `Absent`.
/// - **Atomic commit**: `commit` applies the batch in order, all or nothing.
pub trait Store: PermissionReader + Send + Sync {
    /// Create or overwrite the permission at `key`.
    fn grant(&self, key: &PermissionKey, conditions: &[Condition]) -> Result<GrantResult>;

    /// Delete the permission at `key`, if present.
    fn revoke(&self, key: &PermissionKey) -> Result<RevokeResult>;

    /// Apply every mutation of `batch`, in order, as one atomic unit.
    ///
    /// On error nothing from the batch is visible.
    fn commit(&self, batch: &ChangeBatch) -> Result<CommitReport>;

    /// All permissions scoped to `target`, sorted by key.
    fn permissions_on(&self, target: &Account) -> Result<Vec<Permission>>;

    /// All permissions `who` holds on `target`, sorted by key.
    fn permissions_of(&self, who: &Account, target: &Account) -> Result<Vec<Permission>>;

    /// Number of stored permissions.
    fn count(&self) -> Result<usize>;
}
