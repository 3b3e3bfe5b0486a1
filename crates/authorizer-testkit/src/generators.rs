//! Proptest generators for property-based testing.

use proptest::prelude::*;

use authorizer_core::{
    Account, ChangeBatch, Comparator, Condition, Operation, PermissionKey, Word, MAX_ARITY,
};

/// Generate a random Account.
pub fn account() -> impl Strategy<Value = Account> {
    any::<[u8; 20]>().prop_map(Account::from_bytes)
}

/// Generate an account from a small pool, so collisions are common.
pub fn pooled_account(pool: u8) -> impl Strategy<Value = Account> {
    (0..pool).prop_map(|i| Account::from_bytes([i; 20]))
}

/// Generate a random Word.
pub fn word() -> impl Strategy<Value = Word> {
    any::<[u8; 32]>().prop_map(Word::from_bytes)
}

/// Generate a word holding a small integer.
pub fn small_word() -> impl Strategy<Value = Word> {
    (0u64..1_000).prop_map(Word::from)
}

/// Generate a random Operation.
pub fn operation() -> impl Strategy<Value = Operation> {
    any::<[u8; 4]>().prop_map(Operation::from_bytes)
}

/// Generate a Comparator.
pub fn comparator() -> impl Strategy<Value = Comparator> {
    prop_oneof![
        Just(Comparator::Eq),
        Just(Comparator::Neq),
        Just(Comparator::Gt),
        Just(Comparator::Gte),
        Just(Comparator::Lt),
        Just(Comparator::Lte),
    ]
}

/// Generate a Condition over small integers.
pub fn condition() -> impl Strategy<Value = Condition> {
    (comparator(), small_word())
        .prop_map(|(comparator, literal)| Condition::new(comparator, literal))
}

/// Generate a condition list of at most `max_len` entries.
pub fn conditions(max_len: usize) -> impl Strategy<Value = Vec<Condition>> {
    prop::collection::vec(condition(), 0..=max_len)
}

/// Generate a packable ABI type name.
pub fn abi_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("address"),
        Just("uint256"),
        Just("uint8"),
        Just("bool"),
        Just("bytes32"),
        Just("bytes4"),
    ]
}

/// Generate a well-formed function signature with packable parameters.
pub fn signature() -> impl Strategy<Value = String> {
    (
        "[a-z][a-zA-Z0-9]{0,15}",
        prop::collection::vec(abi_type(), 0..=MAX_ARITY),
    )
        .prop_map(|(name, params)| format!("{name}({})", params.join(",")))
}

/// Generate a PermissionKey drawn from small pools.
pub fn permission_key() -> impl Strategy<Value = PermissionKey> {
    (pooled_account(4), pooled_account(2), 0u8..3).prop_map(|(who, target, op)| {
        PermissionKey::new(who, target, Operation::from_bytes([op; 4]))
    })
}

/// Generate a batch of grants and revokes over a small key space.
pub fn change_batch(max_len: usize) -> impl Strategy<Value = ChangeBatch> {
    prop::collection::vec(
        (permission_key(), prop::option::of(conditions(3))),
        0..=max_len,
    )
    .prop_map(|entries| {
        let mut batch = ChangeBatch::new();
        for (key, grant) in entries {
            match grant {
                Some(conditions) => batch.grant(key, conditions),
                None => batch.revoke(key),
            }
        }
        batch
    })
}
