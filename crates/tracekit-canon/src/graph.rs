//! A value representation that can express genuinely cyclic structures.
//!
//! `serde_json::Value` trees are always acyclic once constructed, so the
//! "[Circular]" substitution rule in §4.5 can't be exercised against it
//! directly. `GraphValue` is the same shape plus `Rc`-linked containers,
//! letting a caller build a structure that references itself before handing
//! it to [`canonicalize`](crate::canonicalize). This is the supplemental
//! type referenced in SPEC_FULL.md §4.5.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Number;

/// A list or map node, shared by `Rc` so a later mutation can make it
/// reference an ancestor (building a cycle).
pub type SharedList = Rc<RefCell<Vec<GraphValue>>>;
pub type SharedMap = Rc<RefCell<Vec<(String, GraphValue)>>>;

/// A canonicalizable value, possibly containing cycles.
#[derive(Clone)]
pub enum GraphValue {
    /// Absent / "undefined" — dropped during canonicalization, never
    /// preserved on output (§4.5).
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(SharedList),
    Map(SharedMap),
}

impl GraphValue {
    pub fn list(items: Vec<GraphValue>) -> Self {
        GraphValue::List(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: Vec<(String, GraphValue)>) -> Self {
        GraphValue::Map(Rc::new(RefCell::new(entries)))
    }

    /// A stable identity for cycle detection: the backing allocation's
    /// address for containers, `None` for everything else (cycles can only
    /// run through containers).
    fn identity(&self) -> Option<usize> {
        match self {
            GraphValue::List(l) => Some(Rc::as_ptr(l) as usize),
            GraphValue::Map(m) => Some(Rc::as_ptr(m) as usize),
            _ => None,
        }
    }
}

impl From<&serde_json::Value> for GraphValue {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => GraphValue::Null,
            serde_json::Value::Bool(b) => GraphValue::Bool(*b),
            serde_json::Value::Number(n) => GraphValue::Number(n.clone()),
            serde_json::Value::String(s) => GraphValue::String(s.clone()),
            serde_json::Value::Array(items) => {
                GraphValue::list(items.iter().map(GraphValue::from).collect())
            }
            serde_json::Value::Object(map) => GraphValue::map(
                map.iter()
                    .map(|(k, v)| (k.clone(), GraphValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Marker literal substituted for a detected cycle, per §4.5.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Convert a (possibly cyclic) [`GraphValue`] into an acyclic
/// `serde_json::Value`, replacing any repeated container along the current
/// path with the literal `"[Circular]"` string and dropping `Undefined`
/// entries.
pub fn canonicalize(value: &GraphValue) -> serde_json::Value {
    let mut ancestors = Vec::new();
    canonicalize_inner(value, &mut ancestors)
}

fn canonicalize_inner(value: &GraphValue, ancestors: &mut Vec<usize>) -> serde_json::Value {
    if let Some(id) = value.identity() {
        if ancestors.contains(&id) {
            return serde_json::Value::String(CIRCULAR_MARKER.to_string());
        }
        ancestors.push(id);
        let result = canonicalize_container(value, ancestors);
        ancestors.pop();
        return result;
    }
    canonicalize_container(value, ancestors)
}

fn canonicalize_container(value: &GraphValue, ancestors: &mut Vec<usize>) -> serde_json::Value {
    match value {
        GraphValue::Undefined => serde_json::Value::Null,
        GraphValue::Null => serde_json::Value::Null,
        GraphValue::Bool(b) => serde_json::Value::Bool(*b),
        GraphValue::Number(n) => serde_json::Value::Number(n.clone()),
        GraphValue::String(s) => serde_json::Value::String(s.clone()),
        GraphValue::List(items) => {
            let items = items.borrow();
            let out: Vec<_> = items
                .iter()
                .filter(|v| !matches!(v, GraphValue::Undefined))
                .map(|v| canonicalize_inner(v, ancestors))
                .collect();
            serde_json::Value::Array(out)
        }
        GraphValue::Map(entries) => {
            let entries = entries.borrow();
            let mut out = serde_json::Map::new();
            for (k, v) in entries.iter() {
                if matches!(v, GraphValue::Undefined) {
                    continue;
                }
                out.insert(k.clone(), canonicalize_inner(v, ancestors));
            }
            serde_json::Value::Object(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_undefined_entries_but_keeps_falsy_values() {
        let v = GraphValue::map(vec![
            ("a".into(), GraphValue::Undefined),
            ("b".into(), GraphValue::Null),
            ("c".into(), GraphValue::Number(0.into())),
            ("d".into(), GraphValue::Bool(false)),
            ("e".into(), GraphValue::String(String::new())),
        ]);
        let out = canonicalize(&v);
        let obj = out.as_object().unwrap();
        assert!(!obj.contains_key("a"));
        assert_eq!(obj["b"], serde_json::Value::Null);
        assert_eq!(obj["c"], serde_json::json!(0));
        assert_eq!(obj["d"], serde_json::json!(false));
        assert_eq!(obj["e"], serde_json::json!(""));
    }

    #[test]
    fn replaces_a_self_reference_with_the_circular_marker() {
        let inner = Rc::new(RefCell::new(vec![("self".to_string(), GraphValue::Null)]));
        let node = GraphValue::Map(inner.clone());
        inner.borrow_mut()[0].1 = node.clone();

        let out = canonicalize(&node);
        let obj = out.as_object().unwrap();
        assert_eq!(
            obj["self"],
            serde_json::Value::String(CIRCULAR_MARKER.to_string())
        );
    }

    #[test]
    fn a_value_that_is_entirely_a_cycle_canonicalizes_without_overflowing() {
        let inner: SharedList = Rc::new(RefCell::new(Vec::new()));
        let node = GraphValue::List(inner.clone());
        inner.borrow_mut().push(node.clone());

        let out = canonicalize(&node);
        assert_eq!(out, serde_json::json!([CIRCULAR_MARKER]));
    }

    #[test]
    fn diamond_shaped_sharing_without_a_cycle_is_not_flagged() {
        let shared = GraphValue::map(vec![("x".into(), GraphValue::Number(1.into()))]);
        let v = GraphValue::list(vec![shared.clone(), shared.clone()]);
        let out = canonicalize(&v);
        assert_eq!(out, serde_json::json!([{"x": 1}, {"x": 1}]));
    }

    #[test]
    fn acyclic_json_roundtrips_through_the_graph_conversion() {
        let input = serde_json::json!({"b": 2, "a": [1, null, true]});
        let graph = GraphValue::from(&input);
        let out = canonicalize(&graph);
        assert_eq!(out, input);
    }
}
