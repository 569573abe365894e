//! Site-mesh-group processor
//!
//! A site mesh group selects its members through a virtual site, so
//! membership is resolved against the `vsites` list the virtual-site
//! processor already derived per site.

use crate::fanout::{self, FetchTarget};
use crate::inventory::{Inventory, ObjectRecord, SiteType};
use crate::processor::ProcessorCtx;
use crate::xc::uris::NAMESPACE_SYSTEM;
use anyhow::{Context, Result};
use serde_json::Value;

pub async fn run(cx: &ProcessorCtx, inv: &mut Inventory) -> Result<()> {
    let listing = cx
        .client
        .list(&cx.client.site_mesh_groups_uri(NAMESPACE_SYSTEM))
        .await
        .context("listing site mesh groups")?;
    tracing::info!("site mesh group listing returned {} entries", listing.len());

    let targets: Vec<FetchTarget> = listing
        .iter()
        .filter_map(|item| item.get("name").and_then(|v| v.as_str()))
        .map(|name| FetchTarget::new(name, cx.client.site_mesh_group_uri(NAMESPACE_SYSTEM, name)))
        .collect();

    for fetched in fanout::fetch_all(&cx.client, targets, cx.workers).await {
        attach(cx, inv, &fetched.name, &fetched.body);
    }

    Ok(())
}

fn attach(cx: &ProcessorCtx, inv: &mut Inventory, name: &str, body: &Value) {
    let Some(vs_name) = group_virtual_site(body.get("spec")) else {
        tracing::warn!("site mesh group {} has no virtual site reference", name);
        return;
    };

    let namespace = body
        .get("metadata")
        .and_then(|m| m.get("namespace"))
        .and_then(|v| v.as_str())
        .unwrap_or(NAMESPACE_SYSTEM)
        .to_string();

    let members: Vec<String> = inv
        .sites
        .iter()
        .filter(|(_, rec)| rec.vsites.iter().any(|v| v == &vs_name))
        .map(|(site_name, _)| site_name.clone())
        .collect();

    for site_name in members {
        if !cx.site_selected(&site_name) {
            continue;
        }
        if let Some(rec) = inv.attach(SiteType::Site, &site_name) {
            rec.smg
                .insert(name.to_string(), ObjectRecord::from_detail(body));
            rec.namespace_mut(&namespace)
                .site_mesh_groups
                .insert(name.to_string(), ObjectRecord::from_detail(body));
            tracing::debug!("attached site mesh group {} to {}", name, site_name);
        }
    }
}

/// The virtual-site reference appears either as a direct name or as a
/// ref list, depending on the API vintage
fn group_virtual_site(spec: Option<&Value>) -> Option<String> {
    let vs = spec?.get("virtual_site")?;
    if let Some(name) = vs.get("name").and_then(|v| v.as_str()) {
        return Some(name.to_string());
    }
    vs.get("ref")
        .and_then(|r| r.as_array())
        .and_then(|r| r.first())
        .and_then(|r| r.get("name"))
        .and_then(|v| v.as_str())
        .map(String::from)
}
