//! # Authorizer Permissions
//!
//! Change sets and the processor that turns them into primitive mutations.
//!
//! ## Overview
//!
//! Administrators describe permission changes as a [`ChangeSet`]: grants and
//! revokes scoped to one target module, naming operations by signature and
//! addressing one or several accounts per entry. The [`ChangeProcessor`]
//! resolves and expands a set into a [`ChangeBatch`](authorizer_core::ChangeBatch)
//! that a store commits atomically.
//!
//! ## Ordering
//!
//! Within a set, every grant is emitted before any revoke. Granting and
//! revoking the same key in one set leaves it revoked.
//!
//! ## Usage
//!
//! ```rust
//! use authorizer_core::{Account, Condition};
//! use authorizer_perms::{ChangeProcessor, ChangeSet};
//!
//! let vault = Account::derive("vault");
//! let token = Account::derive("token-x");
//! let relayers = vec![Account::derive("relayer-a"), Account::derive("relayer-b")];
//!
//! let set = ChangeSet::on(vault).grant(
//!     relayers,
//!     "withdraw(address,uint256,address)",
//!     vec![Condition::eq(token)],
//! );
//!
//! let batch = ChangeProcessor::default().process(&set).unwrap();
//! assert_eq!(batch.len(), 2);
//! ```

pub mod change;
pub mod error;
pub mod processor;

pub use change::{ChangeSet, GrantEntry, RevokeEntry, Who};
pub use error::{PermsError, Result};
pub use processor::{expand, validate_conditions, ChangeProcessor};
