//! Strong type definitions for the Authorizer.
//!
//! Accounts and words are newtypes over fixed-size byte arrays so that a
//! caller identifier can never be confused with an argument value.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Decode a hex string (optional `0x` prefix) into exactly `N` bytes.
pub(crate) fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N]> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits)?;
    if bytes.len() != N {
        return Err(CoreError::InvalidLength {
            expected: N,
            got: bytes.len(),
        });
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// A 20-byte account identifier.
///
/// Identifies either a caller (`who`) or the module a permission is scoped
/// to (`where`). The engine never interprets the bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Account(pub [u8; 20]);

impl Account {
    /// The zero account.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create an account from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derive a deterministic account from a label.
    ///
    /// Takes the last 20 bytes of `Blake3(label)`. Used for fixtures and for
    /// naming well-known modules in configuration.
    pub fn derive(label: &str) -> Self {
        let hash = blake3::hash(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash.as_bytes()[12..]);
        Self(bytes)
    }

    /// Convert to hex string (without prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self> {
        decode_fixed::<20>(s).map(Self)
    }

    /// Encode as a right-aligned word.
    pub fn to_word(&self) -> Word {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(&self.0);
        Word(bytes)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account(0x{})", self.to_hex())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for Account {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for Account {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Account {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Account {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        let arr: [u8; 20] = slice.try_into().map_err(|_| CoreError::InvalidLength {
            expected: 20,
            got: slice.len(),
        })?;
        Ok(Self(arr))
    }
}

impl Serialize for Account {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Account {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Account::from_hex(&s).map_err(de::Error::custom)
    }
}

/// A 32-byte argument word, big-endian.
///
/// Every live argument of a guarded call is flattened to a word before
/// evaluation. Because the bytes are big-endian, the derived `Ord` is the
/// unsigned integer order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Word(pub [u8; 32]);

impl Word {
    /// The zero word.
    pub const ZERO: Self = Self([0u8; 32]);

    /// The largest word (all bits set).
    pub const MAX: Self = Self([0xff; 32]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Right-align up to 32 bytes into a word.
    pub fn right_aligned(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > 32 {
            return Err(CoreError::InvalidLength {
                expected: 32,
                got: bytes.len(),
            });
        }
        let mut word = [0u8; 32];
        word[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(Self(word))
    }

    /// Encode an unsigned integer.
    pub fn from_u128(value: u128) -> Self {
        let mut word = [0u8; 32];
        word[16..].copy_from_slice(&value.to_be_bytes());
        Self(word)
    }

    /// Decode as an unsigned integer, if it fits in 128 bits.
    pub fn to_u128(&self) -> Option<u128> {
        if self.0[..16].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[16..]);
        Some(u128::from_be_bytes(low))
    }

    /// Whether every bit is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Convert to hex string (64 digits, without prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, with or without `0x`.
    ///
    /// Short inputs are right-aligned, so `"0x64"` is the word for 100.
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() {
            return Err(CoreError::InvalidHex("empty word".to_string()));
        }
        let bytes = if digits.len() % 2 == 1 {
            hex::decode(format!("0{digits}"))?
        } else {
            hex::decode(digits)?
        };
        Self::right_aligned(&bytes)
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_u128() {
            Some(value) => write!(f, "Word({value})"),
            None => write!(f, "Word(0x{})", self.to_hex()),
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for Word {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for Word {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Word {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Account> for Word {
    fn from(account: Account) -> Self {
        account.to_word()
    }
}

impl From<bool> for Word {
    fn from(value: bool) -> Self {
        Self::from_u128(value as u128)
    }
}

macro_rules! word_from_uint {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Word {
                fn from(value: $t) -> Self {
                    Self::from_u128(value as u128)
                }
            }
        )*
    };
}

word_from_uint!(u8, u16, u32, u64, u128, usize);

impl Serialize for Word {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Word {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(WordVisitor)
    }
}

/// Accepts hex strings and non-negative integers.
struct WordVisitor;

impl<'de> Visitor<'de> for WordVisitor {
    type Value = Word;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a hex string or a non-negative integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Word, E> {
        Word::from_hex(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Word, E> {
        Ok(Word::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<Word, E> {
        Ok(Word::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Word, E> {
        u64::try_from(v)
            .map(Word::from)
            .map_err(|_| E::custom("negative integers are not words"))
    }
}
