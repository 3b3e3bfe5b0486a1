//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: an initialized in-memory gate
//! and a small guarded component to drive it.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use authorizer::{AuthError, Authorizer, AuthorizerConfig, Execution, Guard};
use authorizer_core::{pack1, pack3, Account, Condition, Operation};
use authorizer_perms::ChangeSet;
use authorizer_store::{CommitReport, MemoryStore, Store};
use thiserror::Error;

/// Signature of [`TestVault::withdraw`].
pub const WITHDRAW: &str = "withdraw(address,uint256,address)";

/// Signature of [`TestVault::set_fee`].
pub const SET_FEE: &str = "setFee(uint256)";

/// A test fixture with an initialized in-memory authorizer.
pub struct TestFixture {
    pub authorizer: Arc<Authorizer<MemoryStore>>,
    pub owner: Account,
}

impl TestFixture {
    /// Create a fixture with the default configuration.
    pub fn new() -> Self {
        Self::with_config(AuthorizerConfig::default())
    }

    /// Create a fixture with a custom configuration.
    pub fn with_config(config: AuthorizerConfig) -> Self {
        let owner = account("owner");
        let authorizer = Authorizer::new(account("authorizer"), MemoryStore::new(), config)
            .expect("fixture config must validate");
        authorizer
            .initialize(&[owner])
            .expect("memory store cannot fail to initialize");
        Self {
            authorizer: Arc::new(authorizer),
            owner,
        }
    }

    /// A deterministic account for a label.
    pub fn account(&self, label: &str) -> Account {
        account(label)
    }

    /// A guard for the component at `this`.
    pub fn guard(&self, this: Account) -> Guard<MemoryStore> {
        Guard::new(Arc::clone(&self.authorizer), this)
    }

    /// A vault at the account labelled `label`.
    pub fn vault(&self, label: &str) -> TestVault<MemoryStore> {
        TestVault::new(self.guard(account(label)))
    }

    /// Grant a permission as the owner.
    pub fn grant(
        &self,
        who: Account,
        target: Account,
        signature: &str,
        conditions: Vec<Condition>,
    ) -> Result<CommitReport, AuthError> {
        self.authorizer
            .authorize(self.owner, who, target, signature, conditions)
    }

    /// Revoke a permission as the owner.
    pub fn revoke(
        &self,
        who: Account,
        target: Account,
        signature: &str,
    ) -> Result<CommitReport, AuthError> {
        self.authorizer.unauthorize(self.owner, who, target, signature)
    }

    /// Apply a change set as the owner.
    pub fn apply(&self, set: &ChangeSet) -> Result<CommitReport, AuthError> {
        self.authorizer.apply(self.owner, set)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A deterministic account for a label.
pub fn account(label: &str) -> Account {
    Account::derive(label)
}

/// A random account.
pub fn random_account() -> Account {
    Account::from_bytes(rand::random())
}

/// Create `count` distinct deterministic accounts.
pub fn accounts(prefix: &str, count: usize) -> Vec<Account> {
    (0..count)
        .map(|i| account(&format!("{prefix}-{i}")))
        .collect()
}

/// Errors from the test vault.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The caller was not authorized.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The vault does not hold enough of the token.
    #[error("insufficient balance of {token}: requested {requested}, available {available}")]
    InsufficientBalance {
        token: Account,
        requested: u128,
        available: u128,
    },
}

/// A completed withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    pub caller: Account,
    pub token: Account,
    pub amount: u128,
    pub recipient: Account,
}

#[derive(Debug, Default)]
struct VaultState {
    balances: BTreeMap<Account, u128>,
    /// Amounts held for withdrawals staged in an open execution.
    reserved: BTreeMap<Account, u128>,
    fee_pct: u64,
    withdrawals: Vec<Withdrawal>,
}

impl VaultState {
    fn available(&self, token: &Account) -> u128 {
        let balance = self.balances.get(token).copied().unwrap_or(0);
        let reserved = self.reserved.get(token).copied().unwrap_or(0);
        balance.saturating_sub(reserved)
    }

    fn release(&mut self, token: Account, amount: u128) {
        let reserved = self.reserved.entry(token).or_default();
        *reserved = reserved.saturating_sub(amount);
    }
}

/// A guarded asset vault.
///
/// `withdraw` and `set_fee` authenticate their caller against the shared
/// gate before touching state.
pub struct TestVault<S: Store> {
    guard: Guard<S>,
    state: RwLock<VaultState>,
}

impl<S: Store> TestVault<S> {
    /// Create an empty vault behind `guard`.
    pub fn new(guard: Guard<S>) -> Self {
        Self {
            guard,
            state: RwLock::new(VaultState::default()),
        }
    }

    /// The vault's account.
    pub fn account(&self) -> Account {
        self.guard.account()
    }

    /// Credit the vault. Unguarded.
    pub fn deposit(&self, token: Account, amount: u128) {
        *self.write().balances.entry(token).or_default() += amount;
    }

    /// The vault's balance of `token`.
    pub fn balance(&self, token: Account) -> u128 {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.balances.get(&token).copied().unwrap_or(0)
    }

    /// The current fee, in percent.
    pub fn fee_pct(&self) -> u64 {
        self.state.read().unwrap_or_else(PoisonError::into_inner).fee_pct
    }

    /// Withdrawals made so far.
    pub fn withdrawals(&self) -> Vec<Withdrawal> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .withdrawals
            .clone()
    }

    /// Send `amount` of `token` to `recipient`.
    pub fn withdraw(
        &self,
        caller: Account,
        token: Account,
        amount: u128,
        recipient: Account,
    ) -> Result<(), VaultError> {
        self.guard.authenticate(
            caller,
            Operation::resolve(WITHDRAW),
            &pack3(token, amount, recipient),
        )?;
        self.debit(caller, token, amount, recipient)
    }

    /// [`withdraw`](Self::withdraw) inside an execution, seeing its
    /// in-flight permission changes.
    ///
    /// The amount is reserved immediately and only leaves the vault once the
    /// execution commits; a failed execution releases it.
    pub fn withdraw_in<'a>(
        &'a self,
        execution: &mut Execution<'a, S>,
        caller: Account,
        token: Account,
        amount: u128,
        recipient: Account,
    ) -> Result<(), VaultError> {
        self.guard.authenticate_in(
            execution,
            caller,
            Operation::resolve(WITHDRAW),
            &pack3(token, amount, recipient),
        )?;
        self.reserve(token, amount)?;

        let withdrawal = Withdrawal {
            caller,
            token,
            amount,
            recipient,
        };
        execution.on_commit(move || self.settle(withdrawal));
        execution.on_discard(move || self.write().release(token, amount));
        Ok(())
    }

    /// Change the fee.
    pub fn set_fee(&self, caller: Account, pct: u64) -> Result<(), VaultError> {
        self.guard
            .authenticate(caller, Operation::resolve(SET_FEE), &pack1(pct))?;
        self.write().fee_pct = pct;
        Ok(())
    }

    fn write(&self) -> RwLockWriteGuard<'_, VaultState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn debit(
        &self,
        caller: Account,
        token: Account,
        amount: u128,
        recipient: Account,
    ) -> Result<(), VaultError> {
        self.reserve(token, amount)?;
        self.settle(Withdrawal {
            caller,
            token,
            amount,
            recipient,
        });
        Ok(())
    }

    /// Hold `amount` of `token` against later withdrawals.
    fn reserve(&self, token: Account, amount: u128) -> Result<(), VaultError> {
        let mut state = self.write();
        let available = state.available(&token);
        if available < amount {
            return Err(VaultError::InsufficientBalance {
                token,
                requested: amount,
                available,
            });
        }
        *state.reserved.entry(token).or_default() += amount;
        Ok(())
    }

    /// Move a reserved amount out of the vault.
    fn settle(&self, withdrawal: Withdrawal) {
        let mut state = self.write();
        state.release(withdrawal.token, withdrawal.amount);
        let balance = state.balances.entry(withdrawal.token).or_default();
        *balance = balance.saturating_sub(withdrawal.amount);
        state.withdrawals.push(withdrawal);
    }
}
