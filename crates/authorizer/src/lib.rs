//! # Authorizer
//!
//! A shared access-control gate with conditional, per-argument permissions.
//!
//! ## Overview
//!
//! Guarded components ask one question before every privileged state
//! change: may `who` call `what` on `target` with these live arguments? A
//! permission is stored per `(who, where, what)` key together with an
//! ordered list of conditions; condition *i* constrains packed argument *i*.
//!
//! - **Grants** create or overwrite a permission
//! - **Revokes** delete it
//! - **Change sets** batch grants and revokes for one target and commit
//!   atomically, grants before revokes
//! - **Administration** is itself a conditional permission on the
//!   authorizer's own account
//!
//! ## Usage
//!
//! ```rust
//! use authorizer::{Authorizer, AuthorizerConfig, ChangeSet};
//! use authorizer::core::{pack3, Account, Condition, Operation};
//! use authorizer::store::MemoryStore;
//!
//! let owner = Account::derive("owner");
//! let relayer = Account::derive("relayer");
//! let vault = Account::derive("vault");
//! let token_x = Account::derive("token-x");
//! let token_y = Account::derive("token-y");
//! let recipient = Account::derive("recipient");
//!
//! let this = Account::derive("authorizer");
//! let config = AuthorizerConfig::default();
//! let authorizer = Authorizer::new(this, MemoryStore::new(), config).unwrap();
//! authorizer.initialize(&[owner]).unwrap();
//!
//! let set = ChangeSet::on(vault).grant(
//!     relayer,
//!     "withdraw(address,uint256,address)",
//!     vec![Condition::eq(token_x)],
//! );
//! authorizer.apply(owner, &set).unwrap();
//!
//! let withdraw = Operation::resolve("withdraw(address,uint256,address)");
//! let allowed = pack3(token_x, 10u64, recipient);
//! let denied = pack3(token_y, 10u64, recipient);
//! assert!(authorizer.is_authorized(relayer, vault, withdraw, &allowed).unwrap());
//! assert!(!authorizer.is_authorized(relayer, vault, withdraw, &denied).unwrap());
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `authorizer::core` - primitives, conditions, packing
//! - `authorizer::store` - storage abstraction, SQLite and in-memory
//! - `authorizer::perms` - change sets and the change processor

pub mod authorizer;
pub mod config;
pub mod error;
pub mod execution;
pub mod guard;

// Re-export component crates
pub use authorizer_core as core;
pub use authorizer_perms as perms;
pub use authorizer_store as store;

pub use crate::authorizer::{Authorizer, Decision, AUTHORIZE, UNAUTHORIZE};
pub use config::AuthorizerConfig;
pub use error::{AuthError, Result};
pub use execution::Execution;
pub use guard::Guard;

// Re-export commonly used types
pub use authorizer_core::{
    pack1, pack2, pack3, pack4, pack5, Account, ArityPolicy, Comparator, Condition, Operation,
    PermissionKey, Word,
};
pub use authorizer_perms::{ChangeSet, Who};
pub use authorizer_store::{MemoryStore, SqliteStore, Store};
