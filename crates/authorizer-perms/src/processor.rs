//! The change processor: change sets in, ordered primitive mutations out.
//!
//! Processing is pure. It resolves signatures, expands multi-account
//! entries and validates conditions, producing a [`ChangeBatch`] whose
//! mutations are ordered all grants first, then all revokes. A set that
//! grants and revokes the same key therefore ends with the key revoked.
//! Committing the batch, and checking who may submit it, belong to the
//! caller.

use authorizer_core::{
    Account, ChangeBatch, Condition, FunctionSignature, Operation, PermissionKey, MAX_ARITY,
};

use crate::change::{ChangeSet, GrantEntry, Who};
use crate::error::{PermsError, Result};

/// Turns change sets into primitive mutation batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeProcessor {
    validate: bool,
    max_conditions: usize,
}

impl Default for ChangeProcessor {
    fn default() -> Self {
        Self {
            validate: true,
            max_conditions: MAX_ARITY,
        }
    }
}

impl ChangeProcessor {
    /// Create a processor.
    ///
    /// With `validate` off, conditions are stored as given.
    pub fn new(validate: bool, max_conditions: usize) -> Self {
        Self {
            validate,
            max_conditions,
        }
    }

    /// Whether grants are validated against their signatures.
    pub fn validates(&self) -> bool {
        self.validate
    }

    /// Process one change set.
    pub fn process(&self, set: &ChangeSet) -> Result<ChangeBatch> {
        let mut batch = ChangeBatch::new();

        for entry in &set.grants {
            if self.validate {
                self.validate_grant(entry)?;
            }
            let what = Operation::resolve(&entry.what);
            for key in expand(&entry.who, set.target, what)? {
                batch.grant(key, entry.conditions.clone());
            }
        }

        for entry in &set.revokes {
            let what = Operation::resolve(&entry.what);
            for key in expand(&entry.who, set.target, what)? {
                batch.revoke(key);
            }
        }

        tracing::debug!(
            target_account = %set.target,
            grants = set.grants.len(),
            revokes = set.revokes.len(),
            mutations = batch.len(),
            "processed change set"
        );
        Ok(batch)
    }

    /// Process several change sets into one batch, set by set in order.
    ///
    /// Each set keeps its own grants-before-revokes ordering.
    pub fn process_all(&self, sets: &[ChangeSet]) -> Result<ChangeBatch> {
        let mut batch = ChangeBatch::new();
        for set in sets {
            batch.extend(self.process(set)?);
        }
        Ok(batch)
    }

    /// Check a grant's conditions against its operation.
    pub fn validate_grant(&self, entry: &GrantEntry) -> Result<()> {
        validate_conditions(&entry.what, &entry.conditions, self.max_conditions)
    }
}

/// Expand `who` into one key per account, in order.
///
/// An empty account list is rejected: it would silently change nothing.
pub fn expand(who: &Who, target: Account, what: Operation) -> Result<Vec<PermissionKey>> {
    let accounts = who.accounts();
    if accounts.is_empty() {
        return Err(PermsError::InvalidChangeSet(format!(
            "empty account list for {what} on {target}"
        )));
    }
    Ok(accounts
        .iter()
        .map(|who| PermissionKey::new(*who, target, what))
        .collect())
}

/// Validate a condition list for the operation named by `signature`.
///
/// Signatures that do not parse are only checked against `max_conditions`.
pub fn validate_conditions(
    signature: &str,
    conditions: &[Condition],
    max_conditions: usize,
) -> Result<()> {
    let invalid = |position: usize, reason: String| PermsError::InvalidCondition {
        what: signature.to_string(),
        position,
        reason,
    };

    if conditions.len() > max_conditions {
        return Err(invalid(
            max_conditions,
            format!("{} conditions, at most {max_conditions} allowed", conditions.len()),
        ));
    }

    let Ok(parsed) = FunctionSignature::parse(signature) else {
        return Ok(());
    };

    if conditions.len() > parsed.arity() {
        return Err(invalid(
            parsed.arity(),
            format!("operation takes {} parameters", parsed.arity()),
        ));
    }

    for (position, (condition, kind)) in conditions.iter().zip(parsed.param_kinds()).enumerate() {
        let ty = &parsed.params()[position];
        let Some(kind) = kind else {
            return Err(invalid(position, format!("parameter type {ty} cannot be conditioned")));
        };
        if condition.comparator.is_ordering() && !kind.supports_ordering() {
            return Err(invalid(
                position,
                format!("{} is not meaningful on {ty}", condition.comparator),
            ));
        }
    }

    Ok(())
}
