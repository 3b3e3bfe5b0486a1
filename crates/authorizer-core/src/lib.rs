//! # Authorizer Core
//!
//! Pure primitives for the Authorizer: accounts, operations, conditions and
//! the evaluation of conditions against packed call arguments.
//!
//! This crate contains no I/O and no storage. Everything here is
//! deterministic computation over fixed-width values.
//!
//! ## Key Types
//!
//! - [`Account`] - 20-byte identifier of a caller or a target module
//! - [`Word`] - 32-byte big-endian argument word
//! - [`Operation`] - 4-byte identifier resolved from a function signature
//! - [`Condition`] - a `(comparator, literal)` pair constraining one argument
//! - [`PermissionKey`] - the `(who, where, what)` triple a permission is stored under
//! - [`ChangeBatch`] - an ordered list of primitive grant/revoke mutations
//!
//! ## Argument Packing
//!
//! Guarded operations flatten their live arguments into words with the
//! fixed-arity helpers [`pack1`] through [`pack5`]:
//!
//! ```rust
//! use authorizer_core::{pack3, Account, Condition, Operation, evaluate};
//!
//! let token = Account::derive("token-x");
//! let recipient = Account::derive("recipient");
//! let args = pack3(token, 10u64, recipient);
//!
//! let conditions = vec![Condition::eq(token)];
//! assert!(evaluate(&conditions, &args));
//!
//! let what = Operation::resolve("withdraw(address,uint256,address)");
//! assert_eq!(what.as_bytes().len(), 4);
//! ```

pub mod condition;
pub mod encoding;
pub mod error;
pub mod evaluate;
pub mod operation;
pub mod params;
pub mod permission;
pub mod types;

pub use condition::{Comparator, Condition};
pub use encoding::{decode_conditions, encode_conditions};
pub use error::{CoreError, Result};
pub use evaluate::{evaluate, evaluate_with, ArityPolicy, Evaluation};
pub use operation::{FunctionSignature, Operation};
pub use params::{pack1, pack2, pack3, pack4, pack5, AuthParam, ParamKind, MAX_ARITY};
pub use permission::{ChangeBatch, Mutation, Permission, PermissionKey};
pub use types::{Account, Word};
