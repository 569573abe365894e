//! Structural diff between two opaque JSON payloads
//!
//! Produces a recursive structure mirroring both inputs in which
//! unchanged leaves are omitted, changed leaves are wrapped in
//! [`DiffNode::Replaced`], keys present only in the old payload are
//! collected on the parent as deletions, and keys present only in the
//! new payload are collected as insertions.

use crate::xc::uris::{SITE_KIND_SMS_V1, SITE_KIND_SMS_V2};
use serde_json::Value;
use std::collections::BTreeMap;

/// One node of the raw diff
#[derive(Debug, Clone, PartialEq)]
pub enum DiffNode {
    /// A leaf-level change; old and new rendered as one replaced unit
    Replaced { old: Value, new: Value },
    /// A mapping (or positional sequence) with per-key changes
    Map(MapDiff),
}

/// Per-key changes of one mapping level
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapDiff {
    /// Keys changed on both sides, in sorted key order
    pub changed: BTreeMap<String, DiffNode>,
    /// Keys present only in the old payload, sorted
    pub deleted: Vec<String>,
    /// Keys present only in the new payload; recognized but not
    /// expanded into display paths by path reconstruction
    pub inserted: BTreeMap<String, Value>,
}

impl MapDiff {
    fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty() && self.inserted.is_empty()
    }
}

/// Does a sequence hold only non-container elements?
///
/// Such sequences are atomic for comparison: reordering or any element
/// change is reported as one wholesale replacement.
fn is_primitive_seq(items: &[Value]) -> bool {
    items.iter().all(|v| !v.is_object() && !v.is_array())
}

/// Compute the structural difference of two payloads.
///
/// Returns `None` when the payloads are deeply equal. Sequences compare
/// positionally; container sequences recurse with stringified indices
/// as keys so index paths survive into reconstruction.
pub fn diff_values(old: &Value, new: &Value) -> Option<DiffNode> {
    if old == new {
        return None;
    }

    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let mut diff = MapDiff::default();

            let mut old_keys: Vec<&String> = old_map.keys().collect();
            old_keys.sort();
            for key in old_keys {
                match new_map.get(key) {
                    Some(new_val) => {
                        if let Some(node) = diff_values(&old_map[key], new_val) {
                            diff.changed.insert(key.clone(), node);
                        }
                    }
                    None => diff.deleted.push(key.clone()),
                }
            }

            for (key, val) in new_map {
                if !old_map.contains_key(key) {
                    diff.inserted.insert(key.clone(), val.clone());
                }
            }

            if diff.is_empty() {
                None
            } else {
                Some(DiffNode::Map(diff))
            }
        }

        (Value::Array(old_items), Value::Array(new_items)) => {
            if is_primitive_seq(old_items) && is_primitive_seq(new_items) {
                return Some(DiffNode::Replaced {
                    old: old.clone(),
                    new: new.clone(),
                });
            }

            let mut diff = MapDiff::default();
            let common = old_items.len().min(new_items.len());

            for idx in 0..common {
                if let Some(node) = diff_values(&old_items[idx], &new_items[idx]) {
                    diff.changed.insert(idx.to_string(), node);
                }
            }
            for idx in common..old_items.len() {
                diff.deleted.push(idx.to_string());
            }
            for idx in common..new_items.len() {
                diff.inserted.insert(idx.to_string(), new_items[idx].clone());
            }

            if diff.is_empty() {
                None
            } else {
                Some(DiffNode::Map(diff))
            }
        }

        _ => Some(DiffNode::Replaced {
            old: old.clone(),
            new: new.clone(),
        }),
    }
}

/// May two site records be compared at all?
///
/// Same kind, or the accepted securemesh v1/v2 migration pair.
pub fn comparable_kinds(old_kind: &str, new_kind: &str) -> bool {
    if old_kind == new_kind {
        return true;
    }
    matches!(
        (old_kind, new_kind),
        (SITE_KIND_SMS_V1, SITE_KIND_SMS_V2) | (SITE_KIND_SMS_V2, SITE_KIND_SMS_V1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_trees_have_no_diff() {
        let t = json!({"a": 1, "b": {"c": [1, 2, 3]}});
        assert!(diff_values(&t, &t).is_none());
    }

    #[test]
    fn changed_leaf_is_replaced() {
        let old = json!({"spec": {"vip_vrrp_mode": "ENABLE"}});
        let new = json!({"spec": {"vip_vrrp_mode": "DISABLE"}});
        let Some(DiffNode::Map(root)) = diff_values(&old, &new) else {
            panic!("expected map diff");
        };
        let Some(DiffNode::Map(spec)) = root.changed.get("spec").cloned() else {
            panic!("expected nested map diff");
        };
        assert_eq!(
            spec.changed.get("vip_vrrp_mode"),
            Some(&DiffNode::Replaced {
                old: json!("ENABLE"),
                new: json!("DISABLE"),
            })
        );
    }

    #[test]
    fn old_only_keys_are_deleted_sorted() {
        let old = json!({"z": 1, "a": 2, "kept": 3});
        let new = json!({"kept": 3});
        let Some(DiffNode::Map(diff)) = diff_values(&old, &new) else {
            panic!("expected map diff");
        };
        assert_eq!(diff.deleted, vec!["a".to_string(), "z".to_string()]);
        assert!(diff.changed.is_empty());
    }

    #[test]
    fn new_only_keys_are_inserted() {
        let old = json!({"kept": 1});
        let new = json!({"kept": 1, "worker_node_count": 2});
        let Some(DiffNode::Map(diff)) = diff_values(&old, &new) else {
            panic!("expected map diff");
        };
        assert_eq!(diff.inserted.get("worker_node_count"), Some(&json!(2)));
        assert!(diff.deleted.is_empty());
    }

    #[test]
    fn primitive_sequence_is_atomic() {
        // Reordering counts as one wholesale replacement
        let old = json!(["a", "b"]);
        let new = json!(["b", "a"]);
        assert!(matches!(
            diff_values(&old, &new),
            Some(DiffNode::Replaced { .. })
        ));
    }

    #[test]
    fn container_sequence_recurses_by_index() {
        let old = json!([{"name": "master-0", "slo_address": "10.0.0.1"}]);
        let new = json!([{"name": "master-0", "slo_address": "10.0.0.2"}]);
        let Some(DiffNode::Map(diff)) = diff_values(&old, &new) else {
            panic!("expected positional diff");
        };
        let Some(DiffNode::Map(elem)) = diff.changed.get("0").cloned() else {
            panic!("expected element diff at index 0");
        };
        assert!(elem.changed.contains_key("slo_address"));
    }

    #[test]
    fn longer_new_sequence_yields_inserted_indices() {
        let old = json!([{"uid": "a"}]);
        let new = json!([{"uid": "a"}, {"uid": "b"}]);
        let Some(DiffNode::Map(diff)) = diff_values(&old, &new) else {
            panic!("expected positional diff");
        };
        assert!(diff.inserted.contains_key("1"));
        assert!(diff.changed.is_empty());
    }

    #[test]
    fn type_change_is_replaced() {
        let old = json!({"x": "text"});
        let new = json!({"x": {"nested": true}});
        let Some(DiffNode::Map(diff)) = diff_values(&old, &new) else {
            panic!("expected map diff");
        };
        assert!(matches!(
            diff.changed.get("x"),
            Some(DiffNode::Replaced { .. })
        ));
    }

    #[test]
    fn incompatible_kinds_are_refused() {
        assert!(!comparable_kinds("aws_vpc_site", "securemesh_site"));
        assert!(!comparable_kinds("gcp_vpc_site", "azure_vnet_site"));
    }

    #[test]
    fn securemesh_migration_pair_is_accepted() {
        assert!(comparable_kinds("securemesh_site", "securemesh_site_v2"));
        assert!(comparable_kinds("securemesh_site_v2", "securemesh_site"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Arbitrary JSON payloads, nested a few levels deep
        fn arb_json() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::from),
                any::<i64>().prop_map(Value::from),
                "[a-z0-9_./-]{0,12}".prop_map(Value::from),
            ];
            leaf.prop_recursive(4, 32, 6, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                    prop::collection::btree_map("[a-z_]{1,8}", inner, 0..6)
                        .prop_map(|m| Value::Object(m.into_iter().collect())),
                ]
            })
        }

        proptest! {
            #[test]
            fn self_diff_is_always_empty(v in arb_json()) {
                prop_assert!(diff_values(&v, &v).is_none());
            }

            #[test]
            fn empty_diff_means_deep_equality(a in arb_json(), b in arb_json()) {
                if diff_values(&a, &b).is_none() {
                    prop_assert_eq!(a, b);
                }
            }

            #[test]
            fn diff_is_deterministic(a in arb_json(), b in arb_json()) {
                prop_assert_eq!(diff_values(&a, &b), diff_values(&a, &b));
            }
        }
    }
}
