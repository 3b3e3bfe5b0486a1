//! Guards: the gate as seen by one guarded component.
//!
//! A component holds a [`Guard`] bound to its own account and calls
//! [`Guard::authenticate`] at the top of every privileged operation, passing
//! the caller, the operation and its packed live arguments.

use std::sync::Arc;

use authorizer_core::{Account, Operation, Word};
use authorizer_store::Store;

use crate::authorizer::Authorizer;
use crate::error::Result;
use crate::execution::Execution;

/// A guarded component's handle on the shared gate.
pub struct Guard<S: Store> {
    authorizer: Arc<Authorizer<S>>,
    this: Account,
}

impl<S: Store> Clone for Guard<S> {
    fn clone(&self) -> Self {
        Self {
            authorizer: Arc::clone(&self.authorizer),
            this: self.this,
        }
    }
}

impl<S: Store> Guard<S> {
    /// Bind `this` component's account to a shared gate.
    pub fn new(authorizer: Arc<Authorizer<S>>, this: Account) -> Self {
        Self { authorizer, this }
    }

    /// The guarded component's account.
    pub fn account(&self) -> Account {
        self.this
    }

    /// The shared gate.
    pub fn authorizer(&self) -> &Arc<Authorizer<S>> {
        &self.authorizer
    }

    /// Whether `who` may call `what` on this component.
    pub fn is_authorized(&self, who: Account, what: Operation, args: &[Word]) -> Result<bool> {
        self.authorizer.is_authorized(who, self.this, what, args)
    }

    /// Fail with `PermissionDenied` unless `who` may call `what` on this
    /// component with `args`.
    pub fn authenticate(&self, who: Account, what: Operation, args: &[Word]) -> Result<()> {
        self.authorizer.authenticate(who, self.this, what, args)
    }

    /// [`authenticate`](Self::authenticate) against an execution's in-flight
    /// state.
    pub fn authenticate_in(
        &self,
        execution: &Execution<'_, S>,
        who: Account,
        what: Operation,
        args: &[Word],
    ) -> Result<()> {
        execution.authenticate(who, self.this, what, args)
    }
}
