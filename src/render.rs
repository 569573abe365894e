//! Presentation sink
//!
//! Renders (path, values) change records and inventory summaries as a
//! bordered text table or delimited text. Two resolved shapes expand
//! into extra rows at render time: CPU flag strings are chunked so one
//! row stays readable, and USB device records get one row per fact.

use crate::diff::Change;
use crate::inventory::{Inventory, NamespaceSlice, SiteRecord};
use serde_json::Value;

/// CPU flags are one long space-separated string; chunk for display
const FLAGS_TOKENS_PER_ROW: usize = 15;

/// An ordered table with fixed column headers
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Bordered fixed-width text rendering
    pub fn text(&self) -> String {
        let cols = self.headers.len();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (idx, cell) in row.iter().take(cols).enumerate() {
                widths[idx] = widths[idx].max(cell.len());
            }
        }

        let rule: String = {
            let mut s = String::from("+");
            for w in &widths {
                s.push_str(&"-".repeat(w + 2));
                s.push('+');
            }
            s
        };

        let fmt_row = |cells: &[String]| {
            let mut s = String::from("|");
            for (idx, w) in widths.iter().enumerate() {
                let cell = cells.get(idx).map(String::as_str).unwrap_or("");
                s.push_str(&format!(" {:<width$} |", cell, width = w));
            }
            s
        };

        let mut out = String::new();
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&fmt_row(&self.headers));
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&fmt_row(row));
            out.push('\n');
        }
        out.push_str(&rule);
        out
    }

    /// Delimited-text rendering (RFC 4180 style quoting)
    pub fn csv(&self) -> String {
        let mut out = String::new();
        out.push_str(&csv_line(&self.headers));
        for row in &self.rows {
            out.push('\n');
            out.push_str(&csv_line(row));
        }
        out
    }
}

fn csv_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| csv_field(c))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Build the comparison table from reconstructed changes.
///
/// Columns are `path` and `values`; most changes become one row, the
/// render-time expansions several.
pub fn diff_table(changes: &[Change]) -> Table {
    let mut table = Table::new(&["path", "values"]);
    for change in changes {
        for (path, value) in expand_change(change) {
            table.add_row(vec![path, value]);
        }
    }
    table
}

/// Object inventory of a snapshot: one row per site followed by one
/// row per object advertised to it
pub fn inventory_table(inv: &Inventory) -> Table {
    let mut table = Table::new(&["type", "subtype_a", "subtype_b", "object_name"]);

    for (name, rec) in &inv.sites {
        table.add_row(vec!["site".into(), "N/A".into(), "N/A".into(), name.clone()]);
        inventory_rows(&mut table, rec);
    }
    for (name, rec) in &inv.virtual_sites {
        table.add_row(vec![
            "virtual_site".into(),
            "N/A".into(),
            "N/A".into(),
            name.clone(),
        ]);
        inventory_rows(&mut table, rec);
    }
    table
}

fn inventory_rows(table: &mut Table, rec: &SiteRecord) {
    for slice in rec.namespaces.values() {
        namespace_rows(table, slice);
    }
}

fn namespace_rows(table: &mut Table, slice: &NamespaceSlice) {
    for (protocol, lbs) in &slice.loadbalancer {
        for name in lbs.keys() {
            table.add_row(vec![
                "loadbalancer".into(),
                protocol.clone(),
                "Advertise Policy Custom".into(),
                name.clone(),
            ]);
        }
    }
    for name in slice.origin_pools.keys() {
        table.add_row(vec![
            "origin_pools".into(),
            "N/A".into(),
            "N/A".into(),
            name.clone(),
        ]);
    }
    for (name, proxy) in &slice.proxys {
        let proxy_type = if proxy.spec.get("dynamic_proxy").is_some() {
            "dynamic_proxy"
        } else if proxy.spec.get("http_proxy").is_some() {
            "http_proxy"
        } else {
            "unknown"
        };
        table.add_row(vec![
            "proxy".into(),
            proxy_type.into(),
            "Advertise Policies".into(),
            name.clone(),
        ]);
    }
}

/// Render-time expansion of one change into (path, value) rows
fn expand_change(change: &Change) -> Vec<(String, String)> {
    let final_token = change.path.rsplit('/').next().unwrap_or("");

    // A path-resolution miss is an absent row, not an error
    if change.values.is_empty() {
        return vec![(change.path.clone(), "-".to_string())];
    }

    if final_token == "flags" {
        if let [Value::String(flags)] = change.values.as_slice() {
            let chunks = chunk_flags(flags);
            if chunks.is_empty() {
                // A blank flags string chunks to nothing; keep the row
                return vec![(change.path.clone(), "-".to_string())];
            }
            return chunks
                .into_iter()
                .map(|chunk| (change.path.clone(), chunk))
                .collect();
        }
    }

    if final_token == "usb" {
        if let [Value::Array(devices)] = change.values.as_slice() {
            if devices.iter().all(|d| d.is_object()) {
                return expand_usb(&change.path, devices);
            }
        }
    }

    vec![(change.path.clone(), render_values(&change.values))]
}

/// Chunk a space-separated flags string into rows of fixed token count,
/// preserving order
fn chunk_flags(flags: &str) -> Vec<String> {
    let tokens: Vec<&str> = flags.split_whitespace().collect();
    tokens
        .chunks(FLAGS_TOKENS_PER_ROW)
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// One row per key/value pair per USB device
fn expand_usb(path: &str, devices: &[Value]) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    for (idx, device) in devices.iter().enumerate() {
        if let Value::Object(map) = device {
            for (key, value) in map {
                rows.push((format!("{}/{}/{}", path, idx, key), render_value(value)));
            }
        }
    }
    rows
}

/// Flatten a resolved value list into one display cell
fn render_values(values: &[Value]) -> String {
    match values {
        [] => "-".to_string(),
        [single] => render_value(single),
        many => {
            let joined = many
                .iter()
                .map(render_value)
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{}]", joined)
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(path: &str, values: Vec<Value>) -> Change {
        Change {
            path: path.to_string(),
            values,
        }
    }

    #[test]
    fn flags_chunk_into_rows_of_fifteen() {
        let flags = (0..37).map(|i| format!("f{}", i)).collect::<Vec<_>>().join(" ");
        let c = change("nodes/node0/hw_info/cpu/flags", vec![json!(flags)]);
        let rows = expand_change(&c);

        assert_eq!(rows.len(), 3);
        let sizes: Vec<usize> = rows
            .iter()
            .map(|(_, v)| v.split_whitespace().count())
            .collect();
        assert_eq!(sizes, vec![15, 15, 7]);
        // Order preserved across chunks
        assert!(rows[0].1.starts_with("f0 f1"));
        assert!(rows[2].1.ends_with("f36"));
    }

    #[test]
    fn usb_devices_expand_one_row_per_fact() {
        let devices = json!([
            {"vendor": "Generic", "speed": 480},
            {"vendor": "Hub"}
        ]);
        let c = change(
            "nodes/node0/hw_info/usb",
            vec![devices],
        );
        let rows = expand_change(&c);
        assert_eq!(
            rows,
            vec![
                ("nodes/node0/hw_info/usb/0/speed".to_string(), "480".to_string()),
                ("nodes/node0/hw_info/usb/0/vendor".to_string(), "Generic".to_string()),
                ("nodes/node0/hw_info/usb/1/vendor".to_string(), "Hub".to_string()),
            ]
        );
    }

    #[test]
    fn blank_flags_string_still_renders_a_row() {
        let c = change("nodes/node0/hw_info/cpu/flags", vec![json!("   ")]);
        let rows = expand_change(&c);
        assert_eq!(
            rows,
            vec![("nodes/node0/hw_info/cpu/flags".to_string(), "-".to_string())]
        );
    }

    #[test]
    fn empty_resolution_renders_absent_row() {
        let rows = expand_change(&change("spec/proactive_monitoring", vec![]));
        assert_eq!(rows, vec![("spec/proactive_monitoring".to_string(), "-".to_string())]);
    }

    #[test]
    fn multi_value_resolution_joins_as_list() {
        let rows = expand_change(&change("bgp", vec![json!("a"), json!("b")]));
        assert_eq!(rows[0].1, "[a, b]");
    }

    #[test]
    fn table_text_has_header_and_rules() {
        let mut t = Table::new(&["path", "values"]);
        t.add_row(vec!["kind".into(), "securemesh_site".into()]);
        let text = t.text();
        assert!(text.contains("| path"));
        assert!(text.contains("| kind"));
        assert!(text.starts_with('+'));
    }

    #[test]
    fn inventory_table_lists_sites_then_their_objects() {
        use crate::inventory::{Inventory, ObjectRecord, SiteRecord};

        let mut inv = Inventory::default();
        let mut rec = SiteRecord::default();
        let slice = rec.namespace_mut("prod");
        slice
            .loadbalancer
            .entry("http".into())
            .or_default()
            .insert("lb-1".into(), ObjectRecord::default());
        slice.origin_pools.insert("pool-1".into(), ObjectRecord::default());
        inv.sites.insert("edge-1".into(), rec);

        let table = inventory_table(&inv);
        let kinds: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(kinds, vec!["site", "loadbalancer", "origin_pools"]);
        assert_eq!(table.rows[0][3], "edge-1");
        assert_eq!(table.rows[1][1], "http");
    }

    #[test]
    fn csv_quotes_fields_with_commas() {
        let mut t = Table::new(&["path", "values"]);
        t.add_row(vec!["bgp".into(), "[a, b]".into()]);
        let csv = t.csv();
        assert_eq!(csv, "path,values\nbgp,\"[a, b]\"");
    }
}
