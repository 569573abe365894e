//! Origin-pool processor
//!
//! An origin server hides its site reference inside one of four one-of
//! wrappers, each holding a `site_locator` that names a site or a
//! virtual site.

use crate::fanout::{self, FetchTarget};
use crate::inventory::{Inventory, ObjectRecord, SiteType};
use crate::processor::ProcessorCtx;
use crate::xc::uris::ORIGIN_SERVER_TYPES;
use anyhow::{Context, Result};
use serde_json::Value;

pub async fn run(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    let namespaces = inv.namespaces.clone();
    let mut targets = Vec::new();

    for namespace in &namespaces {
        let collection = cx.client.origin_pools_uri(namespace);
        let listing = cx
            .client
            .list(&collection)
            .await
            .with_context(|| format!("listing origin pools in namespace {}", namespace))?;

        for item in &listing {
            if let Some(name) = item.get("name").and_then(|v| v.as_str()) {
                targets.push(FetchTarget::new(name, format!("{}/{}", collection, name)));
            }
        }
    }

    tracing::info!("fetching {} origin pool details", targets.len());

    for fetched in fanout::fetch_all(&cx.client, targets, cx.workers).await {
        attach(cx, inv, &fetched.body);
    }

    Ok(())
}

fn attach(cx: &ProcessorCtx, inv: &mut Inventory, body: &Value) {
    let Some(name) = body
        .get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(|v| v.as_str())
    else {
        tracing::warn!("origin pool detail without metadata.name, skipped");
        return;
    };
    let Some(namespace) = body
        .get("metadata")
        .and_then(|m| m.get("namespace"))
        .and_then(|v| v.as_str())
    else {
        tracing::warn!("origin pool {} without metadata.namespace, skipped", name);
        return;
    };

    for (site_type, site_name) in located_sites(body.get("spec")) {
        if !cx.site_selected(&site_name) {
            continue;
        }
        if let Some(rec) = inv.attach(site_type, &site_name) {
            rec.namespace_mut(namespace)
                .origin_pools
                .insert(name.to_string(), ObjectRecord::from_detail(body));
            tracing::debug!(
                "attached origin pool {} to {} in namespace {}",
                name,
                site_name,
                namespace
            );
        }
    }
}

/// Site references from every origin server's `site_locator`
fn located_sites(spec: Option<&Value>) -> Vec<(SiteType, String)> {
    let Some(servers) = spec
        .and_then(|s| s.get("origin_servers"))
        .and_then(|v| v.as_array())
    else {
        return Vec::new();
    };

    let mut refs = Vec::new();
    for server in servers {
        for wrapper in ORIGIN_SERVER_TYPES {
            let Some(locator) = server
                .get(*wrapper)
                .and_then(|w| w.get("site_locator"))
                .and_then(|v| v.as_object())
            else {
                continue;
            };
            for (tag, site) in locator {
                let Some(site_type) = SiteType::from_tag(tag) else {
                    continue;
                };
                if let Some(site_name) = site.get("name").and_then(|v| v.as_str()) {
                    refs.push((site_type, site_name.to_string()));
                }
            }
        }
    }
    refs
}
