//! Change sets: the administrator-facing form of permission changes.
//!
//! A change set is scoped to one target module. Its entries name operations
//! by signature and may address several accounts at once; the processor
//! turns them into primitive mutations.

use serde::{Deserialize, Serialize};

use authorizer_core::{Account, Condition};

use crate::error::Result;

/// The account or accounts an entry applies to.
///
/// Serialized as either a single account or a list of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Who {
    /// One account.
    Single(Account),
    /// Several accounts, each receiving the same change.
    Many(Vec<Account>),
}

impl Who {
    /// The addressed accounts, in order.
    pub fn accounts(&self) -> &[Account] {
        match self {
            Who::Single(account) => std::slice::from_ref(account),
            Who::Many(accounts) => accounts,
        }
    }

    /// Convert to the list form.
    pub fn normalize(self) -> Self {
        match self {
            Who::Single(account) => Who::Many(vec![account]),
            many => many,
        }
    }
}

impl From<Account> for Who {
    fn from(account: Account) -> Self {
        Who::Single(account)
    }
}

impl From<Vec<Account>> for Who {
    fn from(accounts: Vec<Account>) -> Self {
        Who::Many(accounts)
    }
}

impl<const N: usize> From<[Account; N]> for Who {
    fn from(accounts: [Account; N]) -> Self {
        Who::Many(accounts.to_vec())
    }
}

/// A grant entry: `who` may call `what` on the set's target when
/// `conditions` hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantEntry {
    pub who: Who,
    /// Function signature, resolved to an operation when processed.
    pub what: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// A revoke entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeEntry {
    pub who: Who,
    pub what: String,
}

/// A batch of grants and revokes scoped to one target.
///
/// Grants apply before revokes regardless of how the set was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(rename = "where")]
    pub target: Account,
    #[serde(default)]
    pub grants: Vec<GrantEntry>,
    #[serde(default)]
    pub revokes: Vec<RevokeEntry>,
}

impl ChangeSet {
    /// Start an empty change set for `target`.
    pub fn on(target: Account) -> Self {
        Self {
            target,
            grants: Vec::new(),
            revokes: Vec::new(),
        }
    }

    /// Add a grant entry.
    pub fn grant(
        mut self,
        who: impl Into<Who>,
        what: impl Into<String>,
        conditions: Vec<Condition>,
    ) -> Self {
        self.grants.push(GrantEntry {
            who: who.into(),
            what: what.into(),
            conditions,
        });
        self
    }

    /// Add a revoke entry.
    pub fn revoke(mut self, who: impl Into<Who>, what: impl Into<String>) -> Self {
        self.revokes.push(RevokeEntry {
            who: who.into(),
            what: what.into(),
        });
        self
    }

    /// Whether the set contains no entries.
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty() && self.revokes.is_empty()
    }

    /// Parse a change set from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the change set as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authorizer_core::{Comparator, Word};

    #[test]
    fn test_who_normalizes_to_list() {
        let a = Account::from_bytes([1; 20]);
        assert_eq!(Who::from(a).normalize(), Who::Many(vec![a]));
        assert_eq!(Who::from([a, a]).accounts().len(), 2);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "where": "0x00000000000000000000000000000000000000ee",
            "grants": [
                {
                    "who": [
                        "0x0000000000000000000000000000000000000aaa",
                        "0x0000000000000000000000000000000000000bbb"
                    ],
                    "what": "withdraw(address,uint256,address)",
                    "conditions": [
                        { "op": "eq", "value": "0x0000000000000000000000000000000000000011" }
                    ]
                },
                { "who": "0x0000000000000000000000000000000000000ccc", "what": "pause()" }
            ],
            "revokes": [
                { "who": "0x0000000000000000000000000000000000000ddd", "what": "pause()" }
            ]
        }"#;

        let set = ChangeSet::from_json(json).unwrap();
        assert_eq!(set.grants.len(), 2);
        assert_eq!(set.grants[0].who.accounts().len(), 2);
        assert_eq!(set.grants[0].conditions[0].comparator, Comparator::Eq);
        assert_eq!(set.grants[0].conditions[0].literal, Word::from(0x11u64));
        assert!(set.grants[1].conditions.is_empty());
        assert!(matches!(set.revokes[0].who, Who::Single(_)));
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let json = r#"{"where":"0x00000000000000000000000000000000000000ee"}"#;
        let set = ChangeSet::from_json(json).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_json_roundtrip() {
        let set = ChangeSet::on(Account::from_bytes([0xee; 20]))
            .grant(Account::from_bytes([1; 20]), "setFee(uint256)", vec![Condition::lte(500u64)])
            .revoke([Account::from_bytes([2; 20])], "pause()");

        let json = set.to_json().unwrap();
        assert!(json.contains("\"where\""));
        assert_eq!(ChangeSet::from_json(&json).unwrap(), set);
    }

    #[test]
    fn test_rejects_bad_account() {
        assert!(ChangeSet::from_json(r#"{"where":"0x1234"}"#).is_err());
    }
}
