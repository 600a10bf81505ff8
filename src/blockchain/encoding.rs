//! Canonical encoding shared by hashing and signing.
//!
//! Records are rendered as compact JSON with object keys sorted at every
//! level, so two records with equal field values always yield equal bytes no
//! matter how they were built. Numbers use `serde_json`'s shortest round-trip
//! float formatting (`50.0`, `0.1`, `1700000000.123456`).

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A record with a deterministic byte representation
pub trait CanonicalEncode {
    /// Returns the record as a JSON value carrying exactly the hashed fields
    fn canonical_value(&self) -> Value;

    /// Returns the canonical bytes of the record
    fn canonical_bytes(&self) -> Vec<u8> {
        encode_value(&canonicalize(self.canonical_value()))
    }

    /// Returns the hex SHA-256 digest of the canonical bytes
    fn canonical_hash(&self) -> String {
        sha256_hex(&self.canonical_bytes())
    }
}

/// Rebuilds every object in `value` with its keys in lexicographic order.
///
/// The rebuilt maps are filled in sorted order, so the result is sorted
/// whether `serde_json::Map` is backed by a `BTreeMap` or an insertion-ordered
/// map.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Renders an already canonicalized value as compact JSON bytes
pub fn encode_value(value: &Value) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Hex encoded SHA-256 of `data`
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Record(Value);

    impl CanonicalEncode for Record {
        fn canonical_value(&self) -> Value {
            self.0.clone()
        }
    }

    #[test]
    fn test_keys_are_sorted_at_every_level() {
        let value = json!({
            "zeta": 1,
            "alpha": { "y": true, "b": [ { "k": 1, "a": 2 } ] },
        });

        let bytes = encode_value(&canonicalize(value));
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"alpha":{"b":[{"a":2,"k":1}],"y":true},"zeta":1}"#
        );
    }

    #[test]
    fn test_insertion_order_does_not_change_bytes() {
        let mut first = Map::new();
        first.insert("sender".to_string(), json!("network"));
        first.insert("amount".to_string(), json!(50.0));

        let mut second = Map::new();
        second.insert("amount".to_string(), json!(50.0));
        second.insert("sender".to_string(), json!("network"));

        let a = Record(Value::Object(first));
        let b = Record(Value::Object(second));

        assert_eq!(a.canonical_bytes(), b.canonical_bytes());
        assert_eq!(a.canonical_hash(), b.canonical_hash());
    }

    #[test]
    fn test_float_formatting_is_stable() {
        let bytes = encode_value(&canonicalize(json!({ "amount": 50.0, "fee": 0.1 })));
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"amount":50.0,"fee":0.1}"#);
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
