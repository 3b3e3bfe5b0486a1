//! Conditions: a comparator and a literal word constraining one argument.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::Word;

/// How an argument word is compared against a condition literal.
///
/// `Eq` and `Neq` compare raw bit patterns. The ordering comparators treat
/// both words as unsigned 256-bit integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    /// All comparators, in code order.
    pub const ALL: [Comparator; 6] = [
        Comparator::Eq,
        Comparator::Neq,
        Comparator::Gt,
        Comparator::Lt,
        Comparator::Gte,
        Comparator::Lte,
    ];

    /// Convert to the stable numeric code.
    ///
    /// Code 0 is reserved and never produced.
    pub fn to_u8(self) -> u8 {
        match self {
            Comparator::Eq => 1,
            Comparator::Neq => 2,
            Comparator::Gt => 3,
            Comparator::Lt => 4,
            Comparator::Gte => 5,
            Comparator::Lte => 6,
        }
    }

    /// Convert from the numeric code.
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            1 => Some(Comparator::Eq),
            2 => Some(Comparator::Neq),
            3 => Some(Comparator::Gt),
            4 => Some(Comparator::Lt),
            5 => Some(Comparator::Gte),
            6 => Some(Comparator::Lte),
            _ => None,
        }
    }

    /// Whether this comparator depends on numeric order.
    pub fn is_ordering(self) -> bool {
        !matches!(self, Comparator::Eq | Comparator::Neq)
    }

    /// Apply the comparator to `(actual, literal)`.
    pub fn compare(self, actual: &Word, literal: &Word) -> bool {
        match self {
            Comparator::Eq => actual == literal,
            Comparator::Neq => actual != literal,
            Comparator::Gt => actual > literal,
            Comparator::Gte => actual >= literal,
            Comparator::Lt => actual < literal,
            Comparator::Lte => actual <= literal,
        }
    }

    /// The operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Eq => "==",
            Comparator::Neq => "!=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eq" | "==" => Ok(Comparator::Eq),
            "neq" | "!=" => Ok(Comparator::Neq),
            "gt" | ">" => Ok(Comparator::Gt),
            "gte" | ">=" => Ok(Comparator::Gte),
            "lt" | "<" => Ok(Comparator::Lt),
            "lte" | "<=" => Ok(Comparator::Lte),
            _ => Err(CoreError::UnknownComparator(s.to_string())),
        }
    }
}

/// A single constraint on one positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    /// How the argument is compared.
    #[serde(alias = "op")]
    pub comparator: Comparator,

    /// The value the argument is compared against.
    #[serde(alias = "value")]
    pub literal: Word,
}

impl Condition {
    /// Create a condition.
    pub fn new(comparator: Comparator, literal: impl Into<Word>) -> Self {
        Self {
            comparator,
            literal: literal.into(),
        }
    }

    /// Argument must equal `literal`.
    pub fn eq(literal: impl Into<Word>) -> Self {
        Self::new(Comparator::Eq, literal)
    }

    /// Argument must differ from `literal`.
    pub fn neq(literal: impl Into<Word>) -> Self {
        Self::new(Comparator::Neq, literal)
    }

    /// Argument must be greater than `literal`.
    pub fn gt(literal: impl Into<Word>) -> Self {
        Self::new(Comparator::Gt, literal)
    }

    /// Argument must be at least `literal`.
    pub fn gte(literal: impl Into<Word>) -> Self {
        Self::new(Comparator::Gte, literal)
    }

    /// Argument must be less than `literal`.
    pub fn lt(literal: impl Into<Word>) -> Self {
        Self::new(Comparator::Lt, literal)
    }

    /// Argument must be at most `literal`.
    pub fn lte(literal: impl Into<Word>) -> Self {
        Self::new(Comparator::Lte, literal)
    }

    /// Check an argument word against this condition.
    pub fn matches(&self, actual: &Word) -> bool {
        self.comparator.compare(actual, &self.literal)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.comparator, self.literal)
    }
}
