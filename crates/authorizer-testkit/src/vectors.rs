//! Golden test vectors for deterministic verification.
//!
//! Operation ids and derived accounts must be identical across platforms
//! and releases: stored permissions are keyed by them.

use serde::Serialize;

use authorizer_core::{Account, Operation};

/// A golden operation-id vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// The signature string as resolved, byte for byte.
    pub signature: &'static str,
    /// Expected operation id (hex, no prefix).
    pub expected_operation: &'static str,
}

/// A golden derived-account vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountVector {
    pub label: &'static str,
    /// Expected account (hex, no prefix).
    pub expected_account: &'static str,
}

/// Get all operation-id vectors.
pub fn operation_vectors() -> Vec<OperationVector> {
    vec![
        OperationVector {
            name: "vault withdraw",
            signature: "withdraw(address,uint256,address)",
            expected_operation: "de2520e3",
        },
        OperationVector {
            name: "vault fee",
            signature: "setFee(uint256)",
            expected_operation: "bc52b586",
        },
        OperationVector {
            name: "no parameters",
            signature: "pause()",
            expected_operation: "baf3e8c3",
        },
        OperationVector {
            name: "token transfer",
            signature: "transfer(address,uint256)",
            expected_operation: "ceaeebc1",
        },
        OperationVector {
            name: "admin grant",
            signature: "authorize(address,address,bytes4,(uint8,bytes32)[])",
            expected_operation: "33ae61fe",
        },
        OperationVector {
            name: "admin revoke",
            signature: "unauthorize(address,address,bytes4)",
            expected_operation: "354ebad0",
        },
        OperationVector {
            name: "empty string",
            signature: "",
            expected_operation: "af1349b9",
        },
        OperationVector {
            name: "malformed signature still resolves",
            signature: "not a signature",
            expected_operation: "526fe958",
        },
    ]
}

/// Get all derived-account vectors.
pub fn account_vectors() -> Vec<AccountVector> {
    vec![
        AccountVector {
            label: "owner",
            expected_account: "85fb853cfb60701c87f32ad2e98e080e439f6749",
        },
        AccountVector {
            label: "vault",
            expected_account: "ac4071e50c09ed7bcaa2a28adb337298a3c6e3c3",
        },
        AccountVector {
            label: "token-x",
            expected_account: "74732e8a4813a3d01fea1fbd569597d744997396",
        },
    ]
}

/// Check an operation vector against the resolver.
pub fn verify_operation(vector: &OperationVector) -> bool {
    Operation::resolve(vector.signature).to_hex() == vector.expected_operation
}

/// Check an account vector against derivation.
pub fn verify_account(vector: &AccountVector) -> bool {
    hex::decode(vector.expected_account)
        .ok()
        .and_then(|bytes| Account::try_from(bytes.as_slice()).ok())
        .is_some_and(|expected| expected == Account::derive(vector.label))
}

/// Export all vectors as JSON, for implementations in other environments.
pub fn vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "operations": operation_vectors(),
        "accounts": account_vectors(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_vectors() {
        for vector in operation_vectors() {
            assert!(
                verify_operation(&vector),
                "{}: expected {}, got {}",
                vector.name,
                vector.expected_operation,
                Operation::resolve(vector.signature).to_hex()
            );
        }
    }

    #[test]
    fn test_account_vectors() {
        for vector in account_vectors() {
            assert!(verify_account(&vector), "{}", vector.label);
        }
    }

    #[test]
    fn test_vectors_export() {
        let json = vectors_json().unwrap();
        assert!(json.contains("de2520e3"));
        assert!(json.contains("\"accounts\""));
    }
}
