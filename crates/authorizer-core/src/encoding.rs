//! Canonical CBOR encoding of condition lists.
//!
//! Stored conditions use a compact, deterministic layout:
//!
//! ```text
//! [ [code, literal], ... ]
//! ```
//!
//! where `code` is the comparator's numeric code and `literal` is a 32-byte
//! byte string. The same list always encodes to the same bytes.

use ciborium::value::Value;

use crate::condition::{Comparator, Condition};
use crate::error::{CoreError, Result};
use crate::types::Word;

/// Encode a condition list to canonical CBOR bytes.
pub fn encode_conditions(conditions: &[Condition]) -> Result<Vec<u8>> {
    let items = conditions
        .iter()
        .map(|c| {
            Value::Array(vec![
                Value::Integer(c.comparator.to_u8().into()),
                Value::Bytes(c.literal.0.to_vec()),
            ])
        })
        .collect();

    let mut buf = Vec::new();
    ciborium::into_writer(&Value::Array(items), &mut buf)
        .map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(buf)
}

/// Decode a condition list produced by [`encode_conditions`].
pub fn decode_conditions(bytes: &[u8]) -> Result<Vec<Condition>> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(CoreError::DecodingError("expected an array".into()));
    };

    items.into_iter().map(decode_condition).collect()
}

fn decode_condition(item: Value) -> Result<Condition> {
    let malformed =
        |reason: &str| CoreError::DecodingError(format!("malformed condition: {reason}"));

    let Value::Array(fields) = item else {
        return Err(malformed("expected a pair"));
    };
    let [code, literal]: [Value; 2] = fields
        .try_into()
        .map_err(|_| malformed("expected exactly two fields"))?;

    let code = match code {
        Value::Integer(i) => {
            u8::try_from(i128::from(i)).map_err(|_| malformed("code out of range"))?
        }
        _ => return Err(malformed("code is not an integer")),
    };
    let comparator =
        Comparator::from_u8(code).ok_or_else(|| malformed(&format!("unknown code {code}")))?;

    let literal = match literal {
        Value::Bytes(b) => {
            let arr: [u8; 32] = b.try_into().map_err(|_| malformed("literal is not 32 bytes"))?;
            Word(arr)
        }
        _ => return Err(malformed("literal is not a byte string")),
    };

    Ok(Condition {
        comparator,
        literal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let conditions = vec![
            Condition::eq(Word::from(1u64)),
            Condition::lte(Word::MAX),
            Condition::neq(Word::ZERO),
        ];
        let bytes = encode_conditions(&conditions).unwrap();
        assert_eq!(decode_conditions(&bytes).unwrap(), conditions);
    }

    #[test]
    fn test_empty_list() {
        let bytes = encode_conditions(&[]).unwrap();
        // CBOR empty array
        assert_eq!(bytes, vec![0x80]);
        assert!(decode_conditions(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let conditions = vec![Condition::gt(100u64)];
        assert_eq!(
            encode_conditions(&conditions).unwrap(),
            encode_conditions(&conditions).unwrap()
        );
    }

    #[test]
    fn test_rejects_unknown_code() {
        let value = Value::Array(vec![Value::Array(vec![
            Value::Integer(9u8.into()),
            Value::Bytes(vec![0u8; 32]),
        ])]);
        let mut buf = Vec::new();
        ciborium::into_writer(&value, &mut buf).unwrap();

        assert!(matches!(
            decode_conditions(&buf),
            Err(CoreError::DecodingError(_))
        ));
    }

    #[test]
    fn test_rejects_short_literal() {
        let value = Value::Array(vec![Value::Array(vec![
            Value::Integer(1u8.into()),
            Value::Bytes(vec![0u8; 20]),
        ])]);
        let mut buf = Vec::new();
        ciborium::into_writer(&value, &mut buf).unwrap();

        assert!(decode_conditions(&buf).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode_conditions(&[0xff, 0x00, 0x13]).is_err());
    }
}
