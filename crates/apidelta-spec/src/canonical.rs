//! Order-insensitive canonical form of JSON trees
//!
//! Objects are rebuilt with sorted keys and every sequence is sorted by the
//! compact encoding of its (already canonical) elements. Two trees are
//! structurally equal when their canonical forms are equal, which makes
//! sequences behave as multisets: reordering never counts as a change, while
//! adding, removing or duplicating an element does.

use serde_json::{Map, Value};

/// Rebuild `value` in canonical form
#[must_use]
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::with_capacity(map.len());
            for key in keys {
                out.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            let mut canonical: Vec<Value> = items.iter().map(canonicalize).collect();
            canonical.sort_by_cached_key(Value::to_string);
            Value::Array(canonical)
        }
        scalar => scalar.clone(),
    }
}

/// Deep equality ignoring object key order and sequence element order
#[must_use]
pub fn structurally_equal(a: &Value, b: &Value) -> bool {
    // Cheap exits before paying for two canonical copies
    match (a, b) {
        (Value::Object(x), Value::Object(y)) if x.len() != y.len() => return false,
        (Value::Array(x), Value::Array(y)) if x.len() != y.len() => return false,
        _ if std::mem::discriminant(a) != std::mem::discriminant(b) => return false,
        _ => {}
    }
    a == b || canonicalize(a) == canonicalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn nested_sequences_are_sorted() {
        let value = json!({"required": ["name", "id"], "tags": [[2, 1], [0]]});
        assert_eq!(
            canonicalize(&value),
            json!({"required": ["id", "name"], "tags": [[0], [1, 2]]})
        );
    }

    #[test]
    fn reordered_enum_is_equal() {
        let a = json!({"schema": {"enum": ["available", "pending", "sold"]}});
        let b = json!({"schema": {"enum": ["sold", "pending", "available"]}});
        assert!(structurally_equal(&a, &b));
    }

    #[test]
    fn reordered_objects_inside_sequence_are_equal() {
        let a = json!([{"name": "id", "in": "path"}, {"name": "q", "in": "query"}]);
        let b = json!([{"in": "query", "name": "q"}, {"in": "path", "name": "id"}]);
        assert!(structurally_equal(&a, &b));
    }

    #[test]
    fn duplicate_element_is_a_change() {
        assert!(!structurally_equal(&json!([1, 2]), &json!([1, 2, 2])));
        assert!(!structurally_equal(&json!([1, 1, 2]), &json!([1, 2, 2])));
    }

    #[test]
    fn scalar_change_is_detected() {
        assert!(!structurally_equal(
            &json!({"get": {"description": "old"}}),
            &json!({"get": {"description": "new"}})
        ));
        assert!(!structurally_equal(&json!("1"), &json!(1)));
    }

    #[test]
    fn added_key_is_detected() {
        assert!(!structurally_equal(
            &json!({"get": {}}),
            &json!({"get": {}, "post": {}})
        ));
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn reverse_sequences(value: &Value) -> Value {
        match value {
            Value::Array(items) => Value::Array(items.iter().rev().map(reverse_sequences).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), reverse_sequences(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    proptest! {
        #[test]
        fn prop_reversing_every_sequence_is_not_a_change(value in arb_json()) {
            prop_assert!(structurally_equal(&value, &reverse_sequences(&value)));
        }

        #[test]
        fn prop_canonicalize_is_idempotent(value in arb_json()) {
            let once = canonicalize(&value);
            prop_assert_eq!(canonicalize(&once), once);
        }
    }
}
