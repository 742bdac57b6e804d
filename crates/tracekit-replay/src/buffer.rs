//! Restoration of wire-serialized byte buffers back into ordinary JSON
//! (§4.4). The source wraps a byte array as `{"type":"Buffer","data":[...]}`
//! to survive JSON transport; `serde_json::Value` has no native byte-array
//! variant, so restoration here means unwrapping the marker object down to
//! a bare array of the same numbers rather than reintroducing a byte type.

use serde_json::Value;

/// Recursively rewrite every `{"type":"Buffer","data":[...]}` object in
/// `value` to the bare `data` array.
pub fn restore_buffers(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if is_buffer_wrapper(map) {
                let data = map.remove("data").unwrap_or(Value::Array(Vec::new()));
                *value = data;
                restore_buffers(value);
                return;
            }
            for v in map.values_mut() {
                restore_buffers(v);
            }
        }
        Value::Array(items) => {
            for item in items {
                restore_buffers(item);
            }
        }
        _ => {}
    }
}

fn is_buffer_wrapper(map: &serde_json::Map<String, Value>) -> bool {
    map.len() == 2
        && matches!(map.get("type"), Some(Value::String(t)) if t == "Buffer")
        && matches!(map.get("data"), Some(Value::Array(_)))
}
