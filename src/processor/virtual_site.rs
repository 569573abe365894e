//! Virtual-site processor
//!
//! Virtual sites are never referenced directly by name from a site, so
//! membership is derived: each virtual site carries label-selector
//! expressions, and every site whose labels satisfy all of them lists
//! that virtual site in its `vsites`.

use crate::fanout::{self, FetchTarget};
use crate::inventory::{Inventory, SiteRecord};
use crate::processor::ProcessorCtx;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;

pub async fn run(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    let listing = cx
        .client
        .list(&cx.client.virtual_sites_uri())
        .await
        .context("listing virtual sites")?;
    tracing::info!("virtual site listing returned {} entries", listing.len());

    let targets: Vec<FetchTarget> = listing
        .iter()
        .filter_map(|item| item.get("name").and_then(|v| v.as_str()))
        .map(|name| FetchTarget::new(name, cx.client.virtual_site_uri(name)))
        .collect();

    for fetched in fanout::fetch_all(&cx.client, targets, cx.workers).await {
        let expressions = selector_expressions(&fetched.body);

        inv.virtual_sites.insert(
            fetched.name.clone(),
            SiteRecord {
                kind: "virtual_site".to_string(),
                metadata: fetched.body.get("metadata").cloned().unwrap_or(Value::Null),
                spec: fetched.body.get("spec").cloned().unwrap_or(Value::Null),
                ..SiteRecord::default()
            },
        );

        for (site_name, rec) in inv.sites.iter_mut() {
            if inv.failed.contains_key(site_name) {
                continue;
            }
            if matches_selector(&rec.labels, &expressions) {
                rec.vsites.push(fetched.name.clone());
            }
        }
    }

    for rec in inv.sites.values_mut() {
        rec.vsites.sort();
        rec.vsites.dedup();
    }

    Ok(())
}

fn selector_expressions(body: &Value) -> Vec<String> {
    body.get("spec")
        .and_then(|s| s.get("site_selector"))
        .and_then(|s| s.get("expressions"))
        .and_then(|v| v.as_array())
        .map(|a| {
            a.iter()
                .filter_map(|e| e.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// All expressions must hold for the labels to match
fn matches_selector(labels: &BTreeMap<String, String>, expressions: &[String]) -> bool {
    !expressions.is_empty() && expressions.iter().all(|e| matches_expression(labels, e))
}

/// Kubernetes-style label selector expression:
/// `k = v`, `k == v`, `k != v`, `k in (a,b)`, `k notin (a,b)`, bare `k`
fn matches_expression(labels: &BTreeMap<String, String>, expression: &str) -> bool {
    let expr = expression.trim();

    if let Some((key, values)) = split_set_expression(expr, " notin ") {
        return labels
            .get(key)
            .map(|v| !values.contains(&v.as_str()))
            .unwrap_or(false);
    }
    if let Some((key, values)) = split_set_expression(expr, " in ") {
        return labels
            .get(key)
            .map(|v| values.contains(&v.as_str()))
            .unwrap_or(false);
    }
    if let Some((key, value)) = split_equality(expr, "!=") {
        return labels.get(key).map(|v| v != value).unwrap_or(false);
    }
    if let Some((key, value)) = split_equality(expr, "==").or_else(|| split_equality(expr, "=")) {
        return labels.get(key).map(|v| v == value).unwrap_or(false);
    }

    // Bare key: existence test
    labels.contains_key(expr)
}

fn split_equality<'a>(expr: &'a str, op: &str) -> Option<(&'a str, &'a str)> {
    let (key, value) = expr.split_once(op)?;
    // A bare `=` must not shadow `==` or `!=`
    let key = key.trim();
    if key.ends_with('!') || key.ends_with('=') || value.starts_with('=') {
        return None;
    }
    Some((key, value.trim()))
}

fn split_set_expression<'a>(expr: &'a str, op: &str) -> Option<(&'a str, Vec<&'a str>)> {
    let (key, rest) = expr.split_once(op)?;
    let values = rest
        .trim()
        .strip_prefix('(')?
        .strip_suffix(')')?
        .split(',')
        .map(str::trim)
        .collect();
    Some((key.trim(), values))
}
