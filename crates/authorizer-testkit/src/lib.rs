//! # Authorizer Testkit
//!
//! Testing utilities for the Authorizer.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: an initialized in-memory gate and a guarded test vault
//! - **Generators**: Proptest strategies for property-based testing
//! - **Golden vectors**: operation ids and derived accounts with known values
//!
//! ## Test Fixtures
//!
//! ```rust
//! use authorizer_core::Condition;
//! use authorizer_testkit::fixtures::{TestFixture, WITHDRAW};
//!
//! let fixture = TestFixture::new();
//! let vault = fixture.vault("vault");
//! let relayer = fixture.account("relayer");
//! let token = fixture.account("token-x");
//!
//! fixture.grant(relayer, vault.account(), WITHDRAW, vec![Condition::eq(token)]).unwrap();
//! vault.deposit(token, 100);
//! vault.withdraw(relayer, token, 10, relayer).unwrap();
//! ```
//!
//! ## Golden Vectors
//!
//! ```rust
//! use authorizer_testkit::vectors::{operation_vectors, verify_operation};
//!
//! for vector in operation_vectors() {
//!     assert!(verify_operation(&vector), "{}", vector.name);
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{account, accounts, random_account, TestFixture, TestVault, VaultError};
