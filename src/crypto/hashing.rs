//! # Canonical Hashing
//!
//! Deterministic digests over JSON structures, used as the pre-image for
//! both signature layers.
//!
//! ## Canonicalization
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CANONICAL HASH PIPELINE                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Structure (any Serialize)                                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  serde_json::Value                                                     │
//! │        │   Object keys sorted lexicographically at EVERY nesting       │
//! │        │   level; array element order preserved                        │
//! │        ▼                                                                │
//! │  Compact JSON string (no extraneous whitespace)                        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  BLAKE3 over the UTF-8 bytes                                           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  32-byte digest (lowercase hex at the string API)                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two independent implementations (the one building a message and the one
//! verifying it) must converge on the same digest regardless of the key
//! insertion order of the input, so sorting must happen at every nesting
//! level, never just at the top.
//!
//! This digest is used exclusively as a signing pre-image; it is not a
//! content-addressing key anywhere in this crate.

use serde::Serialize;

use crate::error::Result;

/// Serialize a value to its canonical compact JSON form
///
/// Relies on `serde_json::Value` storing objects in a `BTreeMap`, which
/// orders keys lexicographically at every nesting level. The crate must not
/// enable serde_json's `preserve_order` feature, or this invariant breaks.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&value)?)
}

/// Compute the canonical BLAKE3 digest of a value, hex-encoded lowercase
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String> {
    Ok(hex::encode(canonical_hash_bytes(value)?))
}

/// Compute the canonical BLAKE3 digest of a value as raw bytes
///
/// This is the exact byte string both signing layers sign.
pub fn canonical_hash_bytes<T: Serialize>(value: &T) -> Result<[u8; 32]> {
    let json = canonical_json(value)?;
    Ok(*blake3::hash(json.as_bytes()).as_bytes())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_key_order_is_irrelevant() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":2,"c":3}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"c":3,"a":2,"b":1}"#).unwrap();

        assert_eq!(canonical_hash(&a).unwrap(), canonical_hash(&b).unwrap());
    }

    #[test]
    fn test_nested_keys_are_sorted_too() {
        let a: Value =
            serde_json::from_str(r#"{"outer":{"z":1,"a":{"y":2,"b":3}},"k":0}"#).unwrap();
        let b: Value =
            serde_json::from_str(r#"{"k":0,"outer":{"a":{"b":3,"y":2},"z":1}}"#).unwrap();

        assert_eq!(canonical_hash(&a).unwrap(), canonical_hash(&b).unwrap());
        assert_eq!(
            canonical_json(&a).unwrap(),
            r#"{"k":0,"outer":{"a":{"b":3,"y":2},"z":1}}"#
        );
    }

    #[test]
    fn test_array_order_is_preserved() {
        let a: Value = serde_json::from_str(r#"{"items":[1,2,3]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"items":[3,2,1]}"#).unwrap();

        assert_ne!(canonical_hash(&a).unwrap(), canonical_hash(&b).unwrap());
    }

    #[test]
    fn test_compact_serialization() {
        let v: Value = serde_json::from_str(r#"{ "a" : 1 ,  "b" : "x y" }"#).unwrap();
        assert_eq!(canonical_json(&v).unwrap(), r#"{"a":1,"b":"x y"}"#);
    }

    #[test]
    fn test_hash_is_stable_and_hex() {
        let v: Value = serde_json::from_str(r#"{"a":1}"#).unwrap();
        let h1 = canonical_hash(&v).unwrap();
        let h2 = canonical_hash(&v).unwrap();

        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_field_changes_change_the_hash() {
        let a: Value = serde_json::from_str(r#"{"a":1,"b":2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":1,"b":3}"#).unwrap();

        assert_ne!(canonical_hash(&a).unwrap(), canonical_hash(&b).unwrap());
    }
}
