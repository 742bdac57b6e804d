//! Deterministic canonicalization, schema derivation, and content hashing.
//!
//! The cross-cutting leaf of the dependency order in SPEC_FULL.md §2: both
//! the tracing core's span payloads and the replay match service's
//! fingerprints go through [`Canonical::of`].

pub mod graph;
pub mod hash;
pub mod schema;

pub use graph::{canonicalize, GraphValue, CIRCULAR_MARKER};

/// A canonicalized value bundled with its derived schema and both hashes
/// (§3's `input_schema`/`input_schema_hash`/`input_value_hash` family).
#[derive(Clone, Debug, PartialEq)]
pub struct Canonical {
    pub value: serde_json::Value,
    pub schema: serde_json::Value,
    pub value_hash: String,
    pub schema_hash: String,
}

impl Canonical {
    /// Canonicalize a graph value (possibly cyclic) and derive its schema
    /// and hashes.
    pub fn of(input: &GraphValue) -> Self {
        let value = graph::canonicalize(input);
        Self::from_canonical_value(value)
    }

    /// Canonicalize plain JSON. `serde_json::Value` trees are always
    /// acyclic, so this never produces a `"[Circular]"` marker; use
    /// [`Canonical::of`] with a [`GraphValue`] to exercise that path.
    pub fn of_json(input: &serde_json::Value) -> Self {
        Self::of(&GraphValue::from(input))
    }

    fn from_canonical_value(value: serde_json::Value) -> Self {
        let schema = schema::schema_of(&value);
        let value_hash = hash::hash_value(&value);
        let schema_hash = hash::hash_value(&schema);
        Self {
            value,
            schema,
            value_hash,
            schema_hash,
        }
    }
}

/// Coerce an arbitrary serializable value into canonical JSON, falling back
/// to its `Debug` string representation if serialization fails (§7:
/// canonicalization errors are never fatal).
pub fn canonicalize_lossy<T: serde::Serialize + std::fmt::Debug>(value: &T) -> serde_json::Value {
    match serde_json::to_value(value) {
        Ok(v) => graph::canonicalize(&GraphValue::from(&v)),
        Err(err) => {
            tracing::debug!(error = %err, "canonicalization fell back to string coercion");
            serde_json::Value::String(format!("{value:?}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_of_json_is_idempotent() {
        let input = serde_json::json!({"b": [1, 2], "a": "x"});
        let once = Canonical::of_json(&input);
        let twice = Canonical::of_json(&once.value);
        assert_eq!(once.value, twice.value);
        assert_eq!(once.value_hash, twice.value_hash);
        assert_eq!(once.schema_hash, twice.schema_hash);
    }

    #[test]
    fn identical_values_produce_identical_hashes() {
        let a = Canonical::of_json(&serde_json::json!({"k": "v"}));
        let b = Canonical::of_json(&serde_json::json!({"k": "v"}));
        assert_eq!(a.value_hash, b.value_hash);
        assert_eq!(a.schema_hash, b.schema_hash);
    }

    #[test]
    fn schema_hash_ignores_values_but_not_shape() {
        let a = Canonical::of_json(&serde_json::json!({"k": "v1"}));
        let b = Canonical::of_json(&serde_json::json!({"k": "v2"}));
        assert_eq!(a.schema_hash, b.schema_hash);

        let c = Canonical::of_json(&serde_json::json!({"k": 1}));
        assert_ne!(a.schema_hash, c.schema_hash);
    }

    #[test]
    fn canonicalize_lossy_falls_back_on_nan() {
        // f64::NAN cannot be represented by serde_json::Number, so
        // serialization of a struct embedding it fails and we fall back to
        // Debug formatting.
        #[derive(serde::Serialize, Debug)]
        struct NotQuiteJson(#[serde(serialize_with = "fail_to_serialize")] f64);

        fn fail_to_serialize<S: serde::Serializer>(_: &f64, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("boom"))
        }

        let out = canonicalize_lossy(&NotQuiteJson(1.0));
        assert!(matches!(out, serde_json::Value::String(_)));
    }
}
