//! Argument packing for guarded operations.
//!
//! The evaluator only sees words. Each supported primitive kind has one
//! canonical encoding: right-aligned in a 32-byte word, big-endian. The
//! packing helpers are a fixed family, one function per arity, so the
//! argument count and kinds of every guarded call are checked statically.

use serde::{Deserialize, Serialize};

use crate::operation::Operation;
use crate::types::{Account, Word};

/// Largest number of arguments a guarded operation can pack.
pub const MAX_ARITY: usize = 5;

/// The primitive argument kinds that can be packed into a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// A 20-byte account identifier.
    Account,
    /// A full 32-byte hash.
    Hash,
    /// An unsigned integer.
    Uint,
    /// A boolean, encoded as 0 or 1.
    Bool,
    /// A short fixed-width identifier (1 to 31 bytes), such as an operation.
    Selector,
}

impl ParamKind {
    /// Map an ABI type name to a kind.
    ///
    /// Returns `None` for types that do not fit a single word losslessly as
    /// one of the supported kinds: dynamic bytes, strings, arrays, tuples and
    /// signed integers.
    pub fn from_abi_type(ty: &str) -> Option<Self> {
        match ty {
            "address" => Some(ParamKind::Account),
            "bool" => Some(ParamKind::Bool),
            "bytes32" => Some(ParamKind::Hash),
            "uint" => Some(ParamKind::Uint),
            _ => {
                if let Some(bits) = ty.strip_prefix("uint") {
                    return bits
                        .parse::<u16>()
                        .ok()
                        .filter(|b| *b > 0 && *b <= 256 && b % 8 == 0)
                        .map(|_| ParamKind::Uint);
                }
                if let Some(len) = ty.strip_prefix("bytes") {
                    return len
                        .parse::<u8>()
                        .ok()
                        .filter(|n| (1..32).contains(n))
                        .map(|_| ParamKind::Selector);
                }
                None
            }
        }
    }

    /// Whether the word encoding preserves a meaningful numeric order.
    ///
    /// Ordering comparators are only accepted on these kinds.
    pub fn supports_ordering(self) -> bool {
        matches!(self, ParamKind::Uint | ParamKind::Selector)
    }
}

/// A value that can be passed as a packed argument.
pub trait AuthParam {
    /// The kind this value packs as.
    const KIND: ParamKind;

    /// Encode the value as a word.
    fn to_word(&self) -> Word;
}

impl AuthParam for Account {
    const KIND: ParamKind = ParamKind::Account;

    fn to_word(&self) -> Word {
        Account::to_word(self)
    }
}

impl AuthParam for Operation {
    const KIND: ParamKind = ParamKind::Selector;

    fn to_word(&self) -> Word {
        Operation::to_word(self)
    }
}

impl AuthParam for Word {
    const KIND: ParamKind = ParamKind::Hash;

    fn to_word(&self) -> Word {
        *self
    }
}

impl AuthParam for [u8; 32] {
    const KIND: ParamKind = ParamKind::Hash;

    fn to_word(&self) -> Word {
        Word(*self)
    }
}

impl AuthParam for bool {
    const KIND: ParamKind = ParamKind::Bool;

    fn to_word(&self) -> Word {
        Word::from(*self)
    }
}

macro_rules! uint_param {
    ($($t:ty),*) => {
        $(
            impl AuthParam for $t {
                const KIND: ParamKind = ParamKind::Uint;

                fn to_word(&self) -> Word {
                    Word::from(*self)
                }
            }
        )*
    };
}

uint_param!(u8, u16, u32, u64, u128, usize);

/// Pack one argument.
pub fn pack1<A: AuthParam>(a: A) -> [Word; 1] {
    [a.to_word()]
}

/// Pack two arguments in declaration order.
pub fn pack2<A: AuthParam, B: AuthParam>(a: A, b: B) -> [Word; 2] {
    [a.to_word(), b.to_word()]
}

/// Pack three arguments in declaration order.
pub fn pack3<A: AuthParam, B: AuthParam, C: AuthParam>(a: A, b: B, c: C) -> [Word; 3] {
    [a.to_word(), b.to_word(), c.to_word()]
}

/// Pack four arguments in declaration order.
pub fn pack4<A: AuthParam, B: AuthParam, C: AuthParam, D: AuthParam>(
    a: A,
    b: B,
    c: C,
    d: D,
) -> [Word; 4] {
    [a.to_word(), b.to_word(), c.to_word(), d.to_word()]
}

/// Pack five arguments in declaration order.
pub fn pack5<A: AuthParam, B: AuthParam, C: AuthParam, D: AuthParam, E: AuthParam>(
    a: A,
    b: B,
    c: C,
    d: D,
    e: E,
) -> [Word; 5] {
    [a.to_word(), b.to_word(), c.to_word(), d.to_word(), e.to_word()]
}
