//! Operation identifiers and signature parsing.
//!
//! An [`Operation`] is the first four bytes of `Blake3(signature)`, where the
//! signature is the human-readable form of a guarded function, e.g.
//! `withdraw(address,uint256,address)`. Resolution is a pure function of
//! the string: no well-formedness checks are made, so a malformed
//! signature still resolves to a stable (if meaningless) identifier.

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::params::ParamKind;
use crate::types::{decode_fixed, Word};

/// Width of an operation identifier in bytes.
pub const OPERATION_LEN: usize = 4;

/// A 4-byte operation identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Operation(pub [u8; OPERATION_LEN]);

impl Operation {
    /// Resolve a signature string to its operation identifier.
    pub fn resolve(signature: &str) -> Self {
        let hash = blake3::hash(signature.as_bytes());
        let mut bytes = [0u8; OPERATION_LEN];
        bytes.copy_from_slice(&hash.as_bytes()[..OPERATION_LEN]);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; OPERATION_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; OPERATION_LEN] {
        &self.0
    }

    /// Convert to hex string (without prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self> {
        decode_fixed::<OPERATION_LEN>(s).map(Self)
    }

    /// Encode as a right-aligned word.
    pub fn to_word(&self) -> Word {
        let mut bytes = [0u8; 32];
        bytes[32 - OPERATION_LEN..].copy_from_slice(&self.0);
        Word(bytes)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation(0x{})", self.to_hex())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for Operation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<[u8; OPERATION_LEN]> for Operation {
    fn from(bytes: [u8; OPERATION_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Operation {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        let arr: [u8; OPERATION_LEN] = slice.try_into().map_err(|_| CoreError::InvalidLength {
            expected: OPERATION_LEN,
            got: slice.len(),
        })?;
        Ok(Self(arr))
    }
}

impl From<Operation> for Word {
    fn from(operation: Operation) -> Self {
        operation.to_word()
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Operation::from_hex(&s).map_err(de::Error::custom)
    }
}

/// A parsed function signature: a name and its ABI parameter types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    name: String,
    params: Vec<String>,
}

impl FunctionSignature {
    /// Parse `name(type,type,...)`.
    ///
    /// Nested tuple types such as `(uint8,bytes32)[]` are kept as a single
    /// parameter. Whitespace is not allowed anywhere.
    pub fn parse(signature: &str) -> Result<Self> {
        let malformed =
            |reason: &str| CoreError::MalformedSignature(format!("{signature}: {reason}"));

        let open = signature.find('(').ok_or_else(|| malformed("missing '('"))?;
        let name = &signature[..open];
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(malformed("invalid name"));
        }
        let inner = signature[open..]
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| malformed("missing ')'"))?;
        if inner.chars().any(char::is_whitespace) {
            return Err(malformed("whitespace"));
        }

        let mut params = Vec::new();
        if !inner.is_empty() {
            let mut depth = 0usize;
            let mut start = 0;
            for (i, c) in inner.char_indices() {
                match c {
                    '(' => depth += 1,
                    ')' => depth = depth.checked_sub(1).ok_or_else(|| malformed("unbalanced ')'"))?,
                    ',' if depth == 0 => {
                        params.push(&inner[start..i]);
                        start = i + 1;
                    }
                    _ => {}
                }
            }
            if depth != 0 {
                return Err(malformed("unbalanced '('"));
            }
            params.push(&inner[start..]);
        }

        if params.iter().any(|p| p.is_empty()) {
            return Err(malformed("empty parameter"));
        }

        Ok(Self {
            name: name.to_string(),
            params: params.into_iter().map(String::from).collect(),
        })
    }

    /// The function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ABI parameter types, in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// The packing kind of each parameter, `None` where the type cannot be
    /// packed into a single word.
    pub fn param_kinds(&self) -> Vec<Option<ParamKind>> {
        self.params.iter().map(|p| ParamKind::from_abi_type(p)).collect()
    }

    /// The canonical text form.
    pub fn canonical(&self) -> String {
        format!("{}({})", self.name, self.params.join(","))
    }

    /// The operation this signature resolves to.
    pub fn operation(&self) -> Operation {
        Operation::resolve(&self.canonical())
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}
