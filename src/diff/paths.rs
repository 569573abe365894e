//! Path reconstruction
//!
//! Turns the raw structural diff into a flat, filtered list of
//! `/`-joined paths a reviewer can read. Deletion markers lose the
//! shape of what was removed, so composite subtrees (namespaces, the
//! per-protocol load balancer split) are re-expanded from the old tree
//! into the individual leaf paths that were actually populated.

use super::engine::{DiffNode, MapDiff};
use serde_json::Value;

/// Internal sub-objects never meaningful to compare; no recursion
pub const SKIP_COMPARE_KEYS: &[&str] = &["system_metadata", "sms"];

/// Keys and full paths whose changes are noise, never reported
pub const EXCLUDE_COMPARE_ATTRIBUTES: &[&str] = &[
    "serial",
    "asset_tag",
    "hw-serial-number",
    "spec/site_to_site_ipsec_connectivity",
];

/// Load balancer protocol tags, in display order
const LB_PROTOCOLS: &[&str] = &["http", "tcp", "udp"];

/// Reconstruct the flattened change-path list from a raw diff.
///
/// `old_site` is the old site record as a JSON value; deletions are
/// re-expanded against it. Output order is deterministic for a given
/// input; sorting for display is the caller's concern.
pub fn reconstruct_paths(diff: &DiffNode, old_site: &Value) -> Vec<String> {
    let mut out = Vec::new();
    if let DiffNode::Map(map) = diff {
        walk(None, map, old_site, &mut out);
    }
    out
}

fn join(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(p) => format!("{}/{}", p, key),
        None => key.to_string(),
    }
}

fn is_excluded(key: &str, path: &str) -> bool {
    EXCLUDE_COMPARE_ATTRIBUTES.contains(&key) || EXCLUDE_COMPARE_ATTRIBUTES.contains(&path)
}

fn walk(prefix: Option<&str>, map: &MapDiff, old_site: &Value, out: &mut Vec<String>) {
    for (key, node) in &map.changed {
        let path = join(prefix, key);
        // Excluded keys and paths never surface, not even through
        // recursion into their subtrees.
        if is_excluded(key, &path) {
            continue;
        }
        match node {
            DiffNode::Replaced { .. } => {
                // One path per replaced unit, old and new as a whole
                out.push(path);
            }
            DiffNode::Map(sub) => {
                if SKIP_COMPARE_KEYS.contains(&key.as_str()) {
                    continue;
                }
                walk(Some(&path), sub, old_site, out);
            }
        }
    }

    for name in &map.deleted {
        let path = join(prefix, name);
        if is_excluded(name, &path) {
            continue;
        }
        expand_deleted(prefix, name, &path, old_site, out);
    }

    // Inserted keys never surface as display paths.
}

/// A bare removal marker lost the removed subtree's shape; re-derive
/// the populated leaf paths from the old tree where that matters.
fn expand_deleted(
    prefix: Option<&str>,
    name: &str,
    path: &str,
    old_site: &Value,
    out: &mut Vec<String>,
) {
    let parent_token = prefix.and_then(|p| p.rsplit('/').next());

    if name == "namespaces" {
        // All namespaces of the old site vanished; one set of category
        // paths per namespace it actually had.
        if let Some(Value::Object(namespaces)) = lookup(old_site, path) {
            for (ns, slice) in namespaces {
                expand_namespace(&format!("{}/{}", path, ns), slice, out);
            }
            return;
        }
    } else if parent_token == Some("namespaces") {
        // A single namespace vanished
        if let Some(slice) = lookup(old_site, path) {
            expand_namespace(path, slice, out);
            return;
        }
    } else if name == "loadbalancer" && in_namespace_scope(prefix) {
        if let Some(lbs) = lookup(old_site, path) {
            expand_load_balancer(path, lbs, out);
            return;
        }
    }

    out.push(path.to_string());
}

/// Is this prefix an already-resolved namespace path (`.../namespaces/<ns>`)?
fn in_namespace_scope(prefix: Option<&str>) -> bool {
    let Some(prefix) = prefix else {
        return false;
    };
    let mut tokens = prefix.rsplit('/');
    let _ns = tokens.next();
    tokens.next() == Some("namespaces")
}

/// Category paths for one namespace slice, populated entries only
fn expand_namespace(ns_path: &str, slice: &Value, out: &mut Vec<String>) {
    if let Some(lbs) = slice.get("loadbalancer") {
        expand_load_balancer(&format!("{}/loadbalancer", ns_path), lbs, out);
    }
    if non_empty_map(slice.get("origin_pools")) {
        out.push(format!("{}/origin_pools", ns_path));
    }
    if non_empty_map(slice.get("proxys")) {
        out.push(format!("{}/proxys", ns_path));
    }
}

/// One path per non-empty protocol under a load balancer split
fn expand_load_balancer(lb_path: &str, lbs: &Value, out: &mut Vec<String>) {
    for proto in LB_PROTOCOLS {
        if non_empty_map(lbs.get(*proto)) {
            out.push(format!("{}/{}", lb_path, proto));
        }
    }
}

fn non_empty_map(value: Option<&Value>) -> bool {
    value
        .and_then(|v| v.as_object())
        .map(|m| !m.is_empty())
        .unwrap_or(false)
}

/// Walk a `/`-joined path into a tree; numeric tokens index sequences.
fn lookup<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = tree;
    for token in path.split('/') {
        current = match current {
            Value::Array(items) => items.get(token.parse::<usize>().ok()?)?,
            Value::Object(map) => map.get(token)?,
            _ => return None,
        };
    }
    Some(current)
}
