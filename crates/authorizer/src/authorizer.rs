//! The Authorizer: the shared access-control gate.
//!
//! Every guarded component asks the same question before a privileged
//! state change: may `who` call `what` on `target` with these arguments?
//! The Authorizer answers it from the permission store, and applies
//! permission changes submitted by administrators.
//!
//! Administration is itself permissioned. Applying a grant of
//! `(who, target, what)` requires the submitter to be authorized for
//! [`AUTHORIZE`] on the authorizer's own account with the packed arguments
//! `(who, target, what)`; a revoke requires [`UNAUTHORIZE`] likewise.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use authorizer_core::{
    evaluate_with, pack3, Account, ArityPolicy, ChangeBatch, Condition, Evaluation, Operation,
    Permission, PermissionKey, Word,
};
use authorizer_perms::{ChangeProcessor, ChangeSet};
use authorizer_store::{CommitReport, PermissionReader, Store};

use crate::config::AuthorizerConfig;
use crate::error::{AuthError, Result};
use crate::execution::Execution;

/// Signature of the operation that allows applying grants.
pub const AUTHORIZE: &str = "authorize(address,address,bytes4,(uint8,bytes32)[])";

/// Signature of the operation that allows applying revokes.
pub const UNAUTHORIZE: &str = "unauthorize(address,address,bytes4)";

/// The outcome of an authorization check, with the reason for a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A permission exists and every condition held.
    Allowed,
    /// No permission is stored for the key.
    NotGranted,
    /// The condition at `position` did not hold.
    ConditionFailed { position: usize },
    /// The argument count is incompatible with the stored conditions.
    ArityMismatch { expected: usize, actual: usize },
}

impl Decision {
    /// Whether the call may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

impl From<Evaluation> for Decision {
    fn from(evaluation: Evaluation) -> Self {
        match evaluation {
            Evaluation::Pass => Decision::Allowed,
            Evaluation::Failed { position } => Decision::ConditionFailed { position },
            Evaluation::ArityMismatch { expected, actual } => {
                Decision::ArityMismatch { expected, actual }
            }
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allowed => write!(f, "allowed"),
            Decision::NotGranted => write!(f, "not granted"),
            Decision::ConditionFailed { position } => write!(f, "condition {position} failed"),
            Decision::ArityMismatch { expected, actual } => {
                write!(f, "expected {expected} arguments, got {actual}")
            }
        }
    }
}

/// The access-control gate.
///
/// Holds the store behind an `Arc` so the gate and the guarded components
/// built on it share one permission table.
///
/// Top-level operations that change permissions (`initialize`, `apply`,
/// `apply_all` and `execute`) run one at a time: each holds the gate's
/// serialization lock from its checks through its commit. Inside
/// [`execute`](Self::execute), change permissions through the
/// [`Execution`]; calling `apply` on the same authorizer there would wait on
/// the lock forever.
pub struct Authorizer<S: Store> {
    /// The authorizer's own account; admin permissions target it.
    account: Account,
    store: Arc<S>,
    config: AuthorizerConfig,
    processor: ChangeProcessor,
    serial: Mutex<()>,
}

impl<S: Store> Authorizer<S> {
    /// Create an authorizer that owns `store`.
    ///
    /// Fails with `Config` if `config` does not validate.
    pub fn new(account: Account, store: S, config: AuthorizerConfig) -> Result<Self> {
        Self::with_shared(account, Arc::new(store), config)
    }

    /// Create an authorizer over a shared store.
    pub fn with_shared(
        account: Account,
        store: Arc<S>,
        config: AuthorizerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            account,
            store,
            processor: config.processor(),
            config,
            serial: Mutex::new(()),
        })
    }

    /// The authorizer's own account.
    pub fn account(&self) -> Account {
        self.account
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configuration.
    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    pub(crate) fn processor(&self) -> &ChangeProcessor {
        &self.processor
    }

    /// Wait for any other top-level operation to finish.
    ///
    /// The lock guards no data, so a poisoned lock is still usable.
    fn serialize(&self) -> MutexGuard<'_, ()> {
        self.serial.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bootstrap
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant both admin operations on the authorizer's own account to each
    /// owner.
    ///
    /// Fails with `AlreadyInitialized` once any permission targets the
    /// authorizer's account.
    pub fn initialize(&self, owners: &[Account]) -> Result<CommitReport> {
        let _serial = self.serialize();
        if !self.store.permissions_on(&self.account)?.is_empty() {
            return Err(AuthError::AlreadyInitialized(self.account));
        }

        let mut batch = ChangeBatch::new();
        for owner in owners {
            for signature in [AUTHORIZE, UNAUTHORIZE] {
                batch.grant(
                    PermissionKey::new(*owner, self.account, Operation::resolve(signature)),
                    Vec::new(),
                );
            }
        }

        let report = self.store.commit(&batch)?;
        tracing::info!(authorizer = %self.account, owners = owners.len(), "initialized authorizer");
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization Checks
    // ─────────────────────────────────────────────────────────────────────────

    /// Decide whether `who` may call `what` on `target` with `args`.
    pub fn decide(
        &self,
        who: Account,
        target: Account,
        what: Operation,
        args: &[Word],
    ) -> Result<Decision> {
        decide(&*self.store, self.config.arity_policy, who, target, what, args)
    }

    /// Whether `who` may call `what` on `target` with `args`.
    ///
    /// Side-effect free. A never-granted key is never authorized.
    pub fn is_authorized(
        &self,
        who: Account,
        target: Account,
        what: Operation,
        args: &[Word],
    ) -> Result<bool> {
        Ok(self.decide(who, target, what, args)?.is_allowed())
    }

    /// Like [`is_authorized`](Self::is_authorized), but a denial is a
    /// `PermissionDenied` error.
    pub fn authenticate(
        &self,
        who: Account,
        target: Account,
        what: Operation,
        args: &[Word],
    ) -> Result<()> {
        authenticate(&*self.store, self.config.arity_policy, who, target, what, args)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permission Changes
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply a change set submitted by `submitter`.
    ///
    /// The whole set commits or none of it does. Every primitive is checked
    /// against the admin permissions held before the set.
    pub fn apply(&self, submitter: Account, set: &ChangeSet) -> Result<CommitReport> {
        let batch = self.processor.process(set)?;
        self.commit_checked(submitter, &batch)
    }

    /// Apply several change sets as one atomic unit.
    pub fn apply_all(&self, submitter: Account, sets: &[ChangeSet]) -> Result<CommitReport> {
        let batch = self.processor.process_all(sets)?;
        self.commit_checked(submitter, &batch)
    }

    /// Grant a single permission.
    pub fn authorize(
        &self,
        submitter: Account,
        who: Account,
        target: Account,
        signature: &str,
        conditions: Vec<Condition>,
    ) -> Result<CommitReport> {
        self.apply(submitter, &ChangeSet::on(target).grant(who, signature, conditions))
    }

    /// Revoke a single permission.
    pub fn unauthorize(
        &self,
        submitter: Account,
        who: Account,
        target: Account,
        signature: &str,
    ) -> Result<CommitReport> {
        self.apply(submitter, &ChangeSet::on(target).revoke(who, signature))
    }

    fn commit_checked(&self, submitter: Account, batch: &ChangeBatch) -> Result<CommitReport> {
        let _serial = self.serialize();
        check_admin(&*self.store, self.config.arity_policy, self.account, submitter, batch)?;
        let report = self.store.commit(batch)?;
        tracing::info!(
            %submitter,
            created = report.created,
            replaced = report.replaced,
            revoked = report.revoked,
            absent = report.absent,
            "committed permission changes"
        );
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Executions
    // ─────────────────────────────────────────────────────────────────────────

    /// Run a top-level operation.
    ///
    /// Permission changes made through the [`Execution`] are visible to
    /// checks later in the same operation. They commit as one batch when
    /// `f` returns `Ok`, and are discarded when it returns `Err`. Effects
    /// components register with [`Execution::on_commit`] run only after that
    /// batch commits; [`Execution::on_discard`] effects run otherwise.
    pub fn execute<'a, T, E, F>(&'a self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Execution<'a, S>) -> std::result::Result<T, E>,
        E: From<AuthError>,
    {
        let _serial = self.serialize();
        let mut execution = Execution::new(self);
        match f(&mut execution) {
            Ok(value) => {
                execution.commit().map_err(E::from)?;
                Ok(value)
            }
            Err(e) => {
                execution.discard();
                Err(e)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether a permission is stored for the key.
    pub fn is_granted(&self, who: Account, target: Account, what: Operation) -> Result<bool> {
        Ok(self.store.is_granted(&PermissionKey::new(who, target, what))?)
    }

    /// The stored conditions for the key, empty when not granted.
    pub fn get_conditions(
        &self,
        who: Account,
        target: Account,
        what: Operation,
    ) -> Result<Vec<Condition>> {
        Ok(self.store.get_conditions(&PermissionKey::new(who, target, what))?)
    }

    /// All permissions scoped to `target`.
    pub fn permissions_on(&self, target: &Account) -> Result<Vec<Permission>> {
        Ok(self.store.permissions_on(target)?)
    }

    /// All permissions `who` holds on `target`.
    pub fn permissions_of(&self, who: &Account, target: &Account) -> Result<Vec<Permission>> {
        Ok(self.store.permissions_of(who, target)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gate logic, shared by committed and in-flight reads
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn decide<R: PermissionReader + ?Sized>(
    reader: &R,
    policy: ArityPolicy,
    who: Account,
    target: Account,
    what: Operation,
    args: &[Word],
) -> Result<Decision> {
    let key = PermissionKey::new(who, target, what);
    let decision = match reader.get_permission(&key)? {
        None => Decision::NotGranted,
        Some(conditions) => Decision::from(evaluate_with(policy, &conditions, args)),
    };
    tracing::debug!(%key, args = args.len(), %decision, "authorization decision");
    Ok(decision)
}

pub(crate) fn authenticate<R: PermissionReader + ?Sized>(
    reader: &R,
    policy: ArityPolicy,
    who: Account,
    target: Account,
    what: Operation,
    args: &[Word],
) -> Result<()> {
    match decide(reader, policy, who, target, what, args)? {
        Decision::Allowed => Ok(()),
        decision => {
            tracing::warn!(%who, %target, %what, %decision, "permission denied");
            Err(AuthError::PermissionDenied {
                who,
                target,
                what,
                decision,
            })
        }
    }
}

/// Check `submitter` may apply every mutation of `batch`.
///
/// All checks read `reader` as it is before the batch.
pub(crate) fn check_admin<R: PermissionReader + ?Sized>(
    reader: &R,
    policy: ArityPolicy,
    authorizer: Account,
    submitter: Account,
    batch: &ChangeBatch,
) -> Result<()> {
    let authorize = Operation::resolve(AUTHORIZE);
    let unauthorize = Operation::resolve(UNAUTHORIZE);

    for mutation in batch {
        let key = mutation.key();
        let (admin_op, action) = if mutation.is_grant() {
            (authorize, "grant")
        } else {
            (unauthorize, "revoke")
        };

        let args = pack3(key.who, key.target, key.what);
        if !decide(reader, policy, submitter, authorizer, admin_op, &args)?.is_allowed() {
            tracing::warn!(%submitter, %key, action, "rejected change set");
            return Err(AuthError::UnauthorizedChangeSet {
                submitter,
                action,
                key: *key,
            });
        }
    }
    Ok(())
}
