//! # Authorizer Store
//!
//! Storage abstraction for the permission table. Provides a trait-based
//! interface with SQLite and in-memory implementations, plus a
//! [`UnitOfWork`] overlay for staging changes that commit as one unit.
//!
//! ## Key Types
//!
//! - [`PermissionReader`] - read access: the lookups the gate needs
//! - [`Store`] - the full store interface: grants, revokes, atomic batches
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - in-memory storage for tests and embedding
//! - [`UnitOfWork`] - pending changes layered over a store
//!
//! ## Usage
//!
//! ```rust
//! use authorizer_core::{Account, Condition, Operation, PermissionKey};
//! use authorizer_store::{MemoryStore, PermissionReader, Store};
//!
//! let store = MemoryStore::new();
//! let key = PermissionKey::new(
//!     Account::derive("relayer"),
//!     Account::derive("vault"),
//!     Operation::resolve("withdraw(address,uint256,address)"),
//! );
//!
//! store.grant(&key, &[Condition::eq(Account::derive("token-x"))]).unwrap();
//! assert!(store.is_granted(&key).unwrap());
//! ```
//!
//! ## Design Notes
//!
//! - **Overwrite on grant**: a grant replaces any existing condition list
//! - **Idempotent revoke**: revoking an absent key reports `Absent`, not an error
//! - **Atomic batches**: [`Store::commit`] applies a whole batch or nothing

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;
pub mod unit_of_work;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CommitReport, GrantResult, PermissionReader, RevokeResult, Store};
pub use unit_of_work::UnitOfWork;
