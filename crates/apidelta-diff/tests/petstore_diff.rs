//! Diff behavior on realistic petstore revisions

use apidelta_diff::{PathChange, PathDiffer};
use apidelta_spec::PathKey;
use apidelta_test_utils::{petstore_v1, petstore_v2, spec_doc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeSet;

#[test]
fn petstore_revision_classification() {
    let result = PathDiffer::new().diff(&spec_doc(petstore_v1()), &spec_doc(petstore_v2()));

    assert_eq!(result.added, BTreeSet::from([PathKey::new("/store/inventory")]));
    assert_eq!(result.updated, BTreeSet::from([PathKey::new("/pet/{petId}")]));
    assert_eq!(result.deleted, BTreeSet::from(["pet_POST".to_string()]));
}

#[test]
fn change_listing_is_sorted_by_path() {
    let changes = PathDiffer::new().changes(&spec_doc(petstore_v1()), &spec_doc(petstore_v2()));
    let order: Vec<&str> = changes.iter().map(|c| c.path().as_str()).collect();
    assert_eq!(order, vec!["/pet", "/pet/{petId}", "/store/inventory"]);
    assert!(matches!(
        changes[0],
        PathChange::MethodRemoved { path_deleted: false, .. }
    ));
}

#[test]
fn reverse_direction_swaps_added_for_deleted() {
    let result = PathDiffer::new().diff(&spec_doc(petstore_v2()), &spec_doc(petstore_v1()));
    assert_eq!(result.deleted, BTreeSet::from(["store_inventory_GET".to_string()]));
    // POST /pet comes back, which changes the surviving /pet subtree
    assert!(result.updated.contains(&PathKey::new("/pet")));
    assert!(result.added.is_empty());
}

#[test]
fn similar_paths_yield_distinct_deletions() {
    let old = spec_doc(json!({"paths": {"/pet/{id}": {"get": {}}, "/pets/{id}": {"get": {}}}}));
    let new = spec_doc(json!({"paths": {"/other": {"get": {}}}}));
    let result = PathDiffer::new().diff(&old, &new);
    assert_eq!(result.deleted.len(), 2);
}

/// Reverse every sequence in the tree
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

fn arb_operation() -> impl Strategy<Value = Value> {
    (
        prop::collection::vec("[a-z]{1,6}", 0..5),
        prop::collection::vec("[a-z]{1,6}", 0..4),
        any::<bool>(),
    )
        .prop_map(|(enum_values, required, deprecated)| {
            json!({
                "deprecated": deprecated,
                "parameters": [{"name": "q", "schema": {"enum": enum_values}}],
                "requestBody": {"content": {"application/json": {"schema": {"required": required}}}}
            })
        })
}

proptest! {
    #[test]
    fn sequence_order_never_registers_as_update(op in arb_operation(), extra in arb_operation()) {
        let old = json!({"paths": {"/pet": {"get": op, "put": extra}}});
        let new = reverse_sequences(&old);
        let result = PathDiffer::new().diff(&spec_doc(old), &spec_doc(new));
        prop_assert!(result.is_empty());
    }

    #[test]
    fn self_diff_is_empty(op in arb_operation()) {
        let spec = json!({"paths": {"/a/{id}": {"post": op}}});
        let result = PathDiffer::new().diff(&spec_doc(spec.clone()), &spec_doc(spec));
        prop_assert!(result.is_empty());
    }
}
