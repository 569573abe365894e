//! Path resolution against a source tree
//!
//! A reconstructed path is only half the story; the reviewer wants the
//! value that lived there. Paths resolve against the old tree, which is
//! guaranteed complete. Any dead end is "nothing to display", never an
//! error.

use serde_json::Value;

/// Resolve a `/`-joined path against a tree.
///
/// Numeric tokens index into sequences; an out-of-range index refers to
/// an element that existed only in the new tree and is skipped. At the
/// final token a primitive resolves to one element, a mapping to its
/// key names, and a sequence resolves whole - except interface records,
/// which reduce to their device names.
pub fn resolve_path(tree: &Value, path: &str) -> Vec<Value> {
    let mut current = tree;

    for token in path.split('/') {
        match current {
            Value::Array(items) => {
                let Ok(idx) = token.parse::<usize>() else {
                    return Vec::new();
                };
                if let Some(next) = items.get(idx) {
                    current = next;
                }
                // out of range: skipped, stay on the sequence
            }
            Value::Object(map) => match map.get(token) {
                Some(next) => current = next,
                None => return Vec::new(),
            },
            _ => return Vec::new(),
        }
    }

    let final_token = path.rsplit('/').next().unwrap_or(path);
    finalize(current, final_token)
}

fn finalize(value: &Value, final_token: &str) -> Vec<Value> {
    match value {
        // A mapping resolves to its key names - a compact summary of
        // what was here.
        Value::Object(map) => map.keys().map(|k| Value::String(k.clone())).collect(),
        Value::Array(items) => {
            if final_token == "interfaces" {
                return items
                    .iter()
                    .filter_map(device_name)
                    .map(Value::String)
                    .collect();
            }
            vec![Value::Array(items.clone())]
        }
        other => vec![other.clone()],
    }
}

/// Device-name field of one interface record.
///
/// Interface records are heterogeneous: some carry the name at the top
/// level, others nest it inside a per-type one-of wrapper.
fn device_name(entry: &Value) -> Option<String> {
    if let Some(name) = entry.get("name").and_then(|v| v.as_str()) {
        return Some(name.to_string());
    }
    if let Some(device) = entry.get("device").and_then(|v| v.as_str()) {
        return Some(device.to_string());
    }
    entry.as_object()?.values().find_map(|wrapped| {
        wrapped
            .get("device")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    })
}
