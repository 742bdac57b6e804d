//! Derives a JSON-Schema-shaped description of a canonical value (§3).
//!
//! The schema carries no values, only shape: `{"type": ..}` for scalars,
//! `{"type": "array", "items": ..}` for arrays, and
//! `{"type": "object", "properties": {..}}` for objects. Because the
//! underlying `serde_json::Map` is kept in default (non-`preserve_order`)
//! mode, key order here — and in every canonicalized value — is always
//! sorted, satisfying the "sorted keys" requirement without a separate
//! sort pass.

use serde_json::{Map, Value};

/// Derive the schema of an already-canonicalized value.
pub fn schema_of(value: &Value) -> Value {
    match value {
        Value::Null => obj_type("null"),
        Value::Bool(_) => obj_type("boolean"),
        Value::Number(n) => obj_type(if n.is_i64() || n.is_u64() {
            "integer"
        } else {
            "number"
        }),
        Value::String(_) => obj_type("string"),
        Value::Array(items) => {
            let mut schema = Map::new();
            schema.insert("type".to_string(), Value::String("array".to_string()));
            let item_schema = items.first().map(schema_of).unwrap_or_else(|| Value::Null);
            schema.insert("items".to_string(), item_schema);
            Value::Object(schema)
        }
        Value::Object(fields) => {
            let mut properties = Map::new();
            for (k, v) in fields {
                properties.insert(k.clone(), schema_of(v));
            }
            let mut schema = Map::new();
            schema.insert("type".to_string(), Value::String("object".to_string()));
            schema.insert("properties".to_string(), Value::Object(properties));
            Value::Object(schema)
        }
    }
}

fn obj_type(ty: &str) -> Value {
    let mut m = Map::new();
    m.insert("type".to_string(), Value::String(ty.to_string()));
    Value::Object(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_schemas() {
        assert_eq!(schema_of(&Value::Null), serde_json::json!({"type": "null"}));
        assert_eq!(
            schema_of(&serde_json::json!(true)),
            serde_json::json!({"type": "boolean"})
        );
        assert_eq!(
            schema_of(&serde_json::json!(42)),
            serde_json::json!({"type": "integer"})
        );
        assert_eq!(
            schema_of(&serde_json::json!(4.2)),
            serde_json::json!({"type": "number"})
        );
        assert_eq!(
            schema_of(&serde_json::json!("x")),
            serde_json::json!({"type": "string"})
        );
    }

    #[test]
    fn object_schema_has_sorted_properties() {
        let schema = schema_of(&serde_json::json!({"b": 1, "a": "x"}));
        let keys: Vec<_> = schema["properties"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn empty_array_has_null_items_schema() {
        let schema = schema_of(&serde_json::json!([]));
        assert_eq!(schema, serde_json::json!({"type": "array", "items": null}));
    }
}
