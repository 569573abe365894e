//! BGP processor
//!
//! BGP objects live in the system namespace and point at one site via
//! `spec.where.{site,virtual_site}.ref[0].name`. They attach at the
//! site level, not inside a namespace slice.

use crate::fanout::{self, FetchTarget};
use crate::inventory::{Inventory, ObjectRecord, SiteType};
use crate::processor::ProcessorCtx;
use anyhow::{Context, Result};
use serde_json::Value;

pub async fn run(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    let listing = cx
        .client
        .list(&cx.client.bgps_uri())
        .await
        .context("listing bgp objects")?;
    tracing::info!("bgp listing returned {} entries", listing.len());

    let targets: Vec<FetchTarget> = listing
        .iter()
        .filter_map(|item| item.get("name").and_then(|v| v.as_str()))
        .map(|name| FetchTarget::new(name, cx.client.bgp_uri(name)))
        .collect();

    for fetched in fanout::fetch_all(&cx.client, targets, cx.workers).await {
        attach(cx, inv, &fetched.name, &fetched.body);
    }

    Ok(())
}

fn attach(cx: &ProcessorCtx, inv: &mut Inventory, name: &str, body: &Value) {
    for (site_type, site_name) in where_sites(body.get("spec").and_then(|s| s.get("where"))) {
        if !cx.site_selected(&site_name) {
            continue;
        }
        if let Some(rec) = inv.attach(site_type, &site_name) {
            rec.bgp
                .insert(name.to_string(), ObjectRecord::from_detail(body));
            tracing::debug!("attached bgp {} to {}", name, site_name);
        }
    }
}

/// `where.{site,virtual_site}.ref[0].name`
fn where_sites(where_clause: Option<&Value>) -> Vec<(SiteType, String)> {
    let Some(map) = where_clause.and_then(|v| v.as_object()) else {
        return Vec::new();
    };

    let mut refs = Vec::new();
    for (tag, clause) in map {
        let Some(site_type) = SiteType::from_tag(tag) else {
            continue;
        };
        let site_name = clause
            .get("ref")
            .and_then(|r| r.as_array())
            .and_then(|r| r.first())
            .and_then(|r| r.get("name"))
            .and_then(|v| v.as_str());
        if let Some(site_name) = site_name {
            refs.push((site_type, site_name.to_string()));
        }
    }
    refs
}
