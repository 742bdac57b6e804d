//! Stable content hashing over canonicalized values (§3, §4.5).

use sha2::{Digest, Sha256};

/// Hash a canonical JSON value by hashing its compact serialization.
///
/// Stable because the canonical form already has deterministic key order
/// (serde_json's default, non-`preserve_order`, map is sorted) and no
/// non-finite floats ever survive canonicalization.
pub fn hash_value(value: &serde_json::Value) -> String {
    // `to_string` cannot fail for a `Value` built by this crate: every
    // number came from a valid `serde_json::Number`.
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    hash_bytes(&bytes)
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_hash_identically() {
        let a = serde_json::json!({"x": 1, "y": [1, 2, 3]});
        let b = serde_json::json!({"y": [1, 2, 3], "x": 1});
        assert_eq!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn different_inputs_hash_differently() {
        let a = serde_json::json!({"x": 1});
        let b = serde_json::json!({"x": 2});
        assert_ne!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn hash_is_lowercase_hex_sha256_length() {
        let h = hash_value(&serde_json::json!(null));
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }
}
