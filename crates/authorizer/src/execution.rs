//! Executions: one top-level operation against in-flight state.
//!
//! An [`Execution`] is created by [`Authorizer::execute`]. Permission
//! changes it applies are staged, not committed; checks made through it
//! read the staged state first, so a nested check observes changes made
//! earlier in the same operation.
//!
//! Guarded components stage their own state changes alongside: an effect
//! registered with [`Execution::on_commit`] runs only once the permission
//! batch has committed, and one registered with [`Execution::on_discard`]
//! runs when the operation fails instead.

use authorizer_core::{Account, ChangeBatch, Condition, Operation, Word};
use authorizer_perms::ChangeSet;
use authorizer_store::{CommitReport, Store, UnitOfWork};

use crate::authorizer::{authenticate, check_admin, decide, Authorizer, Decision};
use crate::error::Result;

type Effect<'a> = Box<dyn FnOnce() + 'a>;

/// A top-level operation in progress.
pub struct Execution<'a, S: Store> {
    authorizer: &'a Authorizer<S>,
    unit: UnitOfWork<'a, S>,
    on_commit: Vec<Effect<'a>>,
    on_discard: Vec<Effect<'a>>,
}

impl<'a, S: Store> Execution<'a, S> {
    pub(crate) fn new(authorizer: &'a Authorizer<S>) -> Self {
        Self {
            authorizer,
            unit: UnitOfWork::new(authorizer.store()),
            on_commit: Vec::new(),
            on_discard: Vec::new(),
        }
    }

    /// The authorizer this execution runs against.
    pub fn authorizer(&self) -> &'a Authorizer<S> {
        self.authorizer
    }

    /// Decide against the in-flight state.
    pub fn decide(
        &self,
        who: Account,
        target: Account,
        what: Operation,
        args: &[Word],
    ) -> Result<Decision> {
        let policy = self.authorizer.config().arity_policy;
        decide(&self.unit, policy, who, target, what, args)
    }

    /// Whether `who` may call `what` on `target`, seeing staged changes.
    pub fn is_authorized(
        &self,
        who: Account,
        target: Account,
        what: Operation,
        args: &[Word],
    ) -> Result<bool> {
        Ok(self.decide(who, target, what, args)?.is_allowed())
    }

    /// Fail with `PermissionDenied` unless authorized against the in-flight
    /// state.
    pub fn authenticate(
        &self,
        who: Account,
        target: Account,
        what: Operation,
        args: &[Word],
    ) -> Result<()> {
        let policy = self.authorizer.config().arity_policy;
        authenticate(&self.unit, policy, who, target, what, args)
    }

    /// Stage a change set.
    ///
    /// Admin checks read the in-flight state as it was before this set.
    /// Returns the number of staged mutations.
    pub fn apply(&mut self, submitter: Account, set: &ChangeSet) -> Result<usize> {
        let batch = self.authorizer.processor().process(set)?;
        self.stage(submitter, &batch)
    }

    /// Stage a single grant.
    pub fn authorize(
        &mut self,
        submitter: Account,
        who: Account,
        target: Account,
        signature: &str,
        conditions: Vec<Condition>,
    ) -> Result<usize> {
        self.apply(submitter, &ChangeSet::on(target).grant(who, signature, conditions))
    }

    /// Stage a single revoke.
    pub fn unauthorize(
        &mut self,
        submitter: Account,
        who: Account,
        target: Account,
        signature: &str,
    ) -> Result<usize> {
        self.apply(submitter, &ChangeSet::on(target).revoke(who, signature))
    }

    /// The mutations staged so far, in order.
    pub fn pending(&self) -> &ChangeBatch {
        self.unit.pending()
    }

    /// Run `effect` after the operation's permission changes commit.
    ///
    /// Effects run in registration order. They never run if the operation
    /// fails or its commit does.
    pub fn on_commit(&mut self, effect: impl FnOnce() + 'a) {
        self.on_commit.push(Box::new(effect));
    }

    /// Run `effect` if the operation is discarded or its commit fails.
    ///
    /// Effects run in reverse registration order, undoing the latest
    /// reservation first.
    pub fn on_discard(&mut self, effect: impl FnOnce() + 'a) {
        self.on_discard.push(Box::new(effect));
    }

    fn stage(&mut self, submitter: Account, batch: &ChangeBatch) -> Result<usize> {
        check_admin(
            &self.unit,
            self.authorizer.config().arity_policy,
            self.authorizer.account(),
            submitter,
            batch,
        )?;
        self.unit.apply(batch);
        tracing::debug!(%submitter, mutations = batch.len(), "staged permission changes");
        Ok(batch.len())
    }

    pub(crate) fn commit(self) -> Result<CommitReport> {
        let staged = self.unit.pending().len();
        let report = match self.unit.commit() {
            Ok(report) => report,
            Err(e) => {
                run_in_reverse(self.on_discard);
                return Err(e.into());
            }
        };
        if staged > 0 || !self.on_commit.is_empty() {
            tracing::info!(
                mutations = staged,
                effects = self.on_commit.len(),
                "committed execution"
            );
        }
        for effect in self.on_commit {
            effect();
        }
        Ok(report)
    }

    pub(crate) fn discard(self) {
        self.unit.discard();
        run_in_reverse(self.on_discard);
    }
}

fn run_in_reverse(effects: Vec<Effect<'_>>) {
    for effect in effects.into_iter().rev() {
        effect();
    }
}
